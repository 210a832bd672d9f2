pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod message;
pub mod model;
pub mod pipeline;
pub mod store;

pub use config::{load_config, Config};
pub use error::{ConfigError, EventmillError, Result};
pub use gateway::{GenerationClient, HttpGateway, Provider};
pub use message::{SourceKind, SourceMessage};
pub use model::Event;
pub use pipeline::{BatchSummary, MessageOutcome, Pipeline, PipelineError};
pub use store::{Database, EventStore, MessageSource, SqliteStore, StoreError};
