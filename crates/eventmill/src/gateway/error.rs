use thiserror::Error;

use super::request::Provider;

/// Maximum length for API error bodies quoted in log lines.
const MAX_LOGGED_BODY_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("No API key configured for provider '{provider}'")]
    MissingKey { provider: Provider },

    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned status {status}: {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("Could not read {provider} response: {detail}")]
    MalformedResponse { provider: Provider, detail: String },
}

impl GatewayError {
    /// Log-safe description. API bodies can be long and may echo request
    /// content, so they are truncated before they reach a log line.
    pub fn summary(&self) -> String {
        match self {
            GatewayError::Api {
                provider,
                status,
                body,
            } => {
                let shortened: String = body.chars().take(MAX_LOGGED_BODY_LENGTH).collect();
                let suffix = if shortened.len() < body.len() {
                    "... (truncated)"
                } else {
                    ""
                };
                format!("{provider} API returned status {status}: {shortened}{suffix}")
            }
            other => other.to_string(),
        }
    }
}
