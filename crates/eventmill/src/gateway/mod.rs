pub mod client;
pub mod error;
pub mod request;

pub use client::{GenerationClient, HttpGateway};
pub use error::GatewayError;
pub use request::{ChatRole, ChatTurn, GenerationRequest, Provider};
