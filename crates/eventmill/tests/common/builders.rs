//! Builders for source messages and scripted generation responses.
//!
//! These keep the test files free of repeated message literals and
//! hand-built JSON strings.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use eventmill::{SourceKind, SourceMessage};

/// Builder for [`SourceMessage`] instances.
///
/// Defaults to a venue newsletter sent on 2025-05-01 with a one-line body.
pub struct MessageBuilder {
    message: SourceMessage,
}

impl MessageBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            message: SourceMessage {
                message_id: id.to_string(),
                sender: "hello@list.example.org".to_string(),
                subject: "This week in Brixton".to_string(),
                body: "Life drawing at The Star on the 10th of May, 7pm.".to_string(),
                sent_at: Utc
                    .with_ymd_and_hms(2025, 5, 1, 8, 0, 0)
                    .single()
                    .expect("valid timestamp"),
                is_newsletter: true,
                source_kind: SourceKind::Venue,
            },
        }
    }

    /// Set the source classification.
    pub fn kind(mut self, kind: SourceKind) -> Self {
        self.message.source_kind = kind;
        self
    }

    /// Mark the message as coming from an aggregator newsletter.
    pub fn aggregator(self) -> Self {
        self.kind(SourceKind::Aggregate)
    }

    /// Set the plain-text body.
    pub fn body(mut self, body: &str) -> Self {
        self.message.body = body.to_string();
        self
    }

    /// Set the sender address.
    pub fn sender(mut self, sender: &str) -> Self {
        self.message.sender = sender.to_string();
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: &str) -> Self {
        self.message.subject = subject.to_string();
        self
    }

    /// Set the newsletter verdict.
    pub fn newsletter(mut self, is_newsletter: bool) -> Self {
        self.message.is_newsletter = is_newsletter;
        self
    }

    /// Set the sent timestamp.
    pub fn sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.message.sent_at = sent_at;
        self
    }

    /// Build the final SourceMessage.
    pub fn build(self) -> SourceMessage {
        self.message
    }
}

/// Wraps candidate objects into the response envelope the extraction
/// stage expects.
pub fn events_response(events: &[Value]) -> String {
    json!({ "events": events }).to_string()
}

/// The smallest candidate that survives normalization and the gate for a
/// venue-sourced message.
pub fn minimal_event(title: &str, start_date: &str) -> Value {
    json!({
        "title": title,
        "start_date": start_date,
    })
}

/// A candidate carrying everything the stricter aggregator gate demands,
/// so it is saved without any enrichment round-trip.
pub fn complete_aggregator_event(title: &str, start_date: &str) -> Value {
    json!({
        "title": title,
        "start_date": start_date,
        "location_type": "venue",
        "location_address_verbatim": "The Star, 2 Acre Lane",
        "location_postcode": "SW2 5SP",
        "organizer_name": "Drink & Draw",
        "event_url": "https://example.org/draw",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder_defaults() {
        let message = MessageBuilder::new("<m1@x>").build();

        assert_eq!(message.message_id, "<m1@x>");
        assert!(message.is_newsletter);
        assert_eq!(message.source_kind, SourceKind::Venue);
    }

    #[test]
    fn test_events_response_envelope() {
        let body = events_response(&[minimal_event("Gig night", "2025-05-10")]);
        let value: Value = serde_json::from_str(&body).expect("valid JSON");

        assert_eq!(value["events"][0]["title"], "Gig night");
    }
}
