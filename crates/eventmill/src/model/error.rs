use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Rejections raised while normalizing or validating a single event record.
/// These are per-record failures; the batch drops the record and carries on.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("recurrence rule '{rule}' does not match the supported RRULE grammar")]
    InvalidRecurrenceRule { rule: String },

    #[error("recurrence rule has no COUNT or UNTIL and the event has no start date to bound it")]
    UnboundedRuleWithoutStartDate,

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("end time {end} is before start time {start} on a single-day event")]
    EndTimeBeforeStartTime { start: NaiveTime, end: NaiveTime },

    #[error("RRULE UNTIL date {until} disagrees with the event end date {end_date}")]
    UntilEndDateMismatch { until: NaiveDate, end_date: NaiveDate },

    #[error("confidence score {value} is outside 0.0..=1.0")]
    ConfidenceOutOfRange { value: f64 },
}
