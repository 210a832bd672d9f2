//! The completeness gate.
//!
//! Last stop before persistence: events that would be useless in a listing
//! (no confidence, aggregator events with no organizer or no way to reach
//! the event) are dropped here. Presence of a title, a start date and a
//! location type is already guaranteed by the typed model, so the gate only
//! checks what the type system cannot.

use crate::model::enums::LocationType;
use crate::model::Event;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.40;

#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub min_confidence: f64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Returns the checks the event fails; empty means it may be persisted.
///
/// Aggregator-sourced events face stricter rules: their newsletters list
/// third-party events secondhand, so an organizer and a usable URL are the
/// only evidence the event is real.
pub fn incomplete_reasons(event: &Event, policy: &GatePolicy) -> Vec<&'static str> {
    let mut failed = Vec::new();

    if event.title.trim().is_empty() {
        failed.push("title");
    }
    if event.parsing_confidence_score < policy.min_confidence {
        failed.push("confidence");
    }

    if event.from_aggregator {
        if !has_text(&event.organizer_name) {
            failed.push("organizer_name");
        }
        if event.location_type == LocationType::Venue {
            if !has_text(&event.location_address_verbatim) {
                failed.push("location_address_verbatim");
            }
            if !has_text(&event.location_postcode) {
                failed.push("location_postcode");
            }
        }
        if !has_text(&event.event_url) && !has_text(&event.booking_url) {
            failed.push("event_url or booking_url");
        }
    }

    failed
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}
