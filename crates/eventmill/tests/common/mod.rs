//! Shared test utilities for eventmill integration tests.
//!
//! This module provides:
//! - `TestHarness` for running the pipeline against scripted generation
//!   responses and an in-memory database
//! - Builders for source messages and extraction responses

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{HarnessBuilder, ScriptedClient, TestHarness};
