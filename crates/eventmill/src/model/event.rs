//! The validated event record.
//!
//! `Event` is the shape persisted to the store and scored by the
//! completeness gate. Loose extraction output lives in
//! [`super::candidate::Candidate`] until the normalizer promotes it here;
//! promotion runs the serde field checks, then [`Event::finalize`] applies
//! rule canonicalization and the cross-field consistency pass.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::enums::{BookingType, EventType, LocationType, OccurrenceType, TargetAudience, TimeOfDay};
use super::error::ValidationError;
use super::rrule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC-822 Message-ID of the newsletter this event was extracted from.
    pub email_message_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Event description copied out of the source text without rephrasing.
    #[serde(default)]
    pub description_verbatim: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, with = "serde_time")]
    pub start_time: Option<chrono::NaiveTime>,
    #[serde(default, with = "serde_time")]
    pub end_time: Option<chrono::NaiveTime>,
    #[serde(default)]
    pub is_all_day: bool,
    /// Coarse slot used when the source gives no clock time.
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub occurrence_type: OccurrenceType,
    /// Canonical `RRULE:`-prefixed recurrence rule, always bounded.
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub location_address_verbatim: Option<String>,
    #[serde(default)]
    pub location_postcode: Option<String>,
    #[serde(default)]
    pub location_neighbourhood: Option<String>,
    #[serde(default)]
    pub location_borough: Option<String>,
    #[serde(default)]
    pub online_url: Option<String>,
    #[serde(default)]
    pub cost_amount: Option<f64>,
    #[serde(default)]
    pub cost_currency: Option<String>,
    #[serde(default)]
    pub is_donation_based: bool,
    /// Set when the source mentions a cost without naming an amount.
    #[serde(default)]
    pub is_cost_tbc: bool,
    #[serde(default)]
    pub cost_description_verbatim: Option<String>,
    #[serde(default)]
    pub booking_type: Option<BookingType>,
    #[serde(default)]
    pub booking_url: Option<String>,
    #[serde(default)]
    pub event_url: Option<String>,
    /// Free-form descriptors, capped at five by the normalizer.
    #[serde(default)]
    pub vibes_tags: Vec<String>,
    #[serde(default = "default_audiences")]
    pub target_audiences: Vec<TargetAudience>,
    #[serde(default)]
    pub event_types: Vec<EventType>,
    #[serde(default)]
    pub organizer_name: Option<String>,
    #[serde(default)]
    pub is_organizer_sender: Option<bool>,
    /// Whether the source newsletter aggregates third-party events. Those
    /// records go through enrichment and a stricter completeness gate.
    #[serde(default)]
    pub from_aggregator: bool,
    /// Extraction self-assessment in `0.0..=1.0`.
    #[serde(default)]
    pub parsing_confidence_score: f64,
}

impl Event {
    /// Canonicalizes the recurrence rule and runs the consistency pass.
    ///
    /// Called once right after promotion from a candidate. The rule pass
    /// needs the (now guaranteed) start date to bound open-ended rules.
    pub fn finalize(&mut self) -> Result<(), ValidationError> {
        if let Some(raw) = self.recurrence_rule.take() {
            self.recurrence_rule = Some(rrule::normalize_rule(&raw, Some(self.start_date))?);
        }
        self.validate()
    }

    /// Cross-field consistency checks.
    ///
    /// Rejects impossible date and time ranges, bounds any still-open
    /// recurrence rule at one year minus a day past the start, and rejects
    /// rules whose `UNTIL` date disagrees with the event's end date.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.parsing_confidence_score) {
            return Err(ValidationError::ConfidenceOutOfRange {
                value: self.parsing_confidence_score,
            });
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }

        let same_day = self.end_date.map_or(true, |end| end == self.start_date);
        if same_day {
            if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
                if end < start {
                    return Err(ValidationError::EndTimeBeforeStartTime { start, end });
                }
            }
        }

        if let Some(rule) = self.recurrence_rule.as_deref() {
            if !rrule::has_bound(rule) {
                let until = self.start_date + Months::new(12) - Days::new(1);
                self.recurrence_rule = Some(rrule::with_until(rule, until));
            }
        }

        if let (Some(rule), Some(end)) = (self.recurrence_rule.as_deref(), self.end_date) {
            if let Some(until) = rrule::until_date(rule)? {
                if until != end {
                    return Err(ValidationError::UntilEndDateMismatch {
                        until,
                        end_date: end,
                    });
                }
            }
        }

        Ok(())
    }
}

mod serde_time {
    //! `HH:MM:SS` on the wire, with `HH:MM` accepted on input. Generation
    //! output uses both forms interchangeably.

    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => NaiveTime::parse_from_str(&text, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

fn default_title() -> String {
    "(untitled event)".to_string()
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

fn default_audiences() -> Vec<TargetAudience> {
    vec![TargetAudience::All]
}
