//! Source message types shared by the store and the extraction pipeline.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Classification of the sending newsletter, assigned upstream at ingest time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A sender that aggregates many third-party events. Triggers the
    /// enrichment path and stricter completeness gating.
    Aggregate,
    /// A venue or organizer announcing its own events.
    Venue,
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Aggregate => "aggregate",
            SourceKind::Venue => "venue",
            SourceKind::Unknown => "unknown",
        }
    }

    pub fn is_aggregator(&self) -> bool {
        matches!(self, SourceKind::Aggregate)
    }
}

impl From<&str> for SourceKind {
    fn from(value: &str) -> Self {
        match value {
            "aggregate" => SourceKind::Aggregate,
            "venue" => SourceKind::Venue,
            _ => SourceKind::Unknown,
        }
    }
}

/// A stored newsletter message awaiting extraction.
///
/// Ingest (mail fetching, classification) happens upstream; by the time a
/// message reaches the pipeline it already carries its newsletter verdict
/// and source classification.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    /// RFC-822 Message-ID of the source email.
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// When the email was sent; gives the extraction prompt its date context.
    pub sent_at: DateTime<Utc>,
    pub is_newsletter: bool,
    pub source_kind: SourceKind,
}

/// Deterministic short hash of an identifier, for log lines.
///
/// Message ids can be long and contain addresses; logs carry this prefix
/// instead of the raw id.
pub fn short_id(input: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    digest[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_round_trip() {
        for kind in [SourceKind::Aggregate, SourceKind::Venue, SourceKind::Unknown] {
            assert_eq!(SourceKind::from(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unrecognized_source_kind_is_unknown() {
        assert_eq!(SourceKind::from("zine"), SourceKind::Unknown);
    }

    #[test]
    fn test_short_id_is_stable_and_short() {
        let a = short_id("<abc@mail.example.com>");
        let b = short_id("<abc@mail.example.com>");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_ne!(short_id("<other@mail.example.com>"), a);
    }
}
