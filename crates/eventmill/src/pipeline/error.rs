use thiserror::Error;

use crate::model::ValidationError;

/// Failures that abort the current message.
///
/// A message that fails with one of these stays unmarked in the ledger, so
/// the next batch run picks it up again from scratch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Generation failed: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("Persistence failed: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Link resolver could not be constructed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Why a single candidate was discarded.
///
/// Dropping a candidate never aborts its message; sibling candidates still
/// proceed and the message is still marked processed.
#[derive(Error, Debug)]
pub enum DropReason {
    #[error("no usable start date")]
    MissingStartDate,

    #[error("unusable dates: {0}")]
    UnusableDates(String),

    #[error("does not fit the event schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("incomplete: {0}")]
    Incomplete(String),
}
