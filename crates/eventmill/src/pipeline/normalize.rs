//! Candidate repair before promotion.
//!
//! Generation output is close to the event schema but rarely on it: times
//! come back as `"tbc"`, dates carry time suffixes, enum lists contain
//! invented values, and refinement merges can clobber pipeline-owned fields.
//! [`repair`] fixes everything fixable in place, then promotes the candidate
//! to a typed [`Event`] and runs its consistency pass. Anything unfixable
//! becomes a [`DropReason`] for that one candidate.

use chrono::NaiveDate;
use serde_json::Value;

use crate::geo::GeoLookup;
use crate::message::SourceMessage;
use crate::model::enums::{EventType, TargetAudience};
use crate::model::{Candidate, Event};

use super::error::DropReason;

const UNTITLED: &str = "(untitled event)";
const MAX_VIBES_TAGS: usize = 5;

/// True when an aggregator candidate is worth a web-search round trip:
/// missing postcode, missing organizer, or a venue with no address.
pub fn needs_enrichment(candidate: &Candidate) -> bool {
    !candidate.has_text("location_postcode")
        || !candidate.has_text("organizer_name")
        || (candidate.get_str("location_type") == Some("venue")
            && !candidate.has_text("location_address_verbatim"))
}

/// Repairs one candidate and promotes it to a typed event.
///
/// Repairs run in a fixed order because later steps rely on earlier ones;
/// the date checks in particular must precede promotion so a candidate with
/// no usable start date is reported as such instead of as a serde error.
pub fn repair(
    mut candidate: Candidate,
    message: &SourceMessage,
    geo: &dyn GeoLookup,
) -> Result<Event, DropReason> {
    for key in ["start_time", "end_time"] {
        if candidate.get_str(key) == Some("tbc") {
            candidate.set_null(key);
        }
    }

    let start = parse_start_date(&candidate)?;
    candidate.set("start_date", start.to_string());
    match parse_end_date(&candidate)? {
        Some(end) => {
            if end < start {
                return Err(DropReason::UnusableDates(format!(
                    "end date {end} before start date {start}"
                )));
            }
            candidate.set("end_date", end.to_string());
        }
        None => candidate.set_null("end_date"),
    }

    // The model validator re-adds the prefix; stripping it here avoids
    // "RRULE:RRULE:" when generation already included one.
    if let Some(rule) = candidate.get_str("recurrence_rule") {
        let trimmed = rule.trim();
        let trimmed = trimmed.strip_prefix("RRULE:").unwrap_or(trimmed).to_string();
        if trimmed.is_empty() {
            candidate.set_null("recurrence_rule");
        } else {
            candidate.set("recurrence_rule", trimmed);
        }
    }

    if is_blank(&candidate, "time_of_day") {
        candidate.set("time_of_day", "tbc");
    }
    sanitize_enum_list(&mut candidate, "target_audiences", |value| {
        TargetAudience::from_wire(value).is_some()
    });
    sanitize_enum_list(&mut candidate, "event_types", |value| {
        EventType::from_wire(value).is_some()
    });

    if is_blank(&candidate, "title") {
        candidate.set("title", UNTITLED);
    }
    candidate.ensure("summary", "");
    candidate.ensure("description_verbatim", "");
    candidate.ensure("occurrence_type", "tbc");
    candidate.ensure("location_type", "tbc");
    candidate.ensure("parsing_confidence_score", 0.5);

    // Pipeline-owned fields win over whatever generation or refinement wrote.
    candidate.set("email_message_id", message.message_id.as_str());
    candidate.set("from_aggregator", message.source_kind.is_aggregator());

    backfill_geography(&mut candidate, geo);
    truncate_vibes(&mut candidate);

    let mut event = candidate.promote().map_err(DropReason::Schema)?;
    event.finalize()?;
    Ok(event)
}

fn parse_start_date(candidate: &Candidate) -> Result<NaiveDate, DropReason> {
    let raw = match candidate.get("start_date") {
        None | Some(Value::Null) => return Err(DropReason::MissingStartDate),
        Some(Value::String(text)) if text.is_empty() => return Err(DropReason::MissingStartDate),
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            return Err(DropReason::UnusableDates(format!(
                "start_date is not a string: {other}"
            )))
        }
    };
    parse_date(&raw)
        .ok_or_else(|| DropReason::UnusableDates(format!("unparseable start_date '{raw}'")))
}

fn parse_end_date(candidate: &Candidate) -> Result<Option<NaiveDate>, DropReason> {
    match candidate.get("end_date") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => parse_date(text)
            .map(Some)
            .ok_or_else(|| DropReason::UnusableDates(format!("unparseable end_date '{text}'"))),
        Some(other) => Err(DropReason::UnusableDates(format!(
            "end_date is not a string: {other}"
        ))),
    }
}

/// `YYYY-MM-DD`, tolerating a trailing `T...` time suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Missing, null or empty-string. Other types are left for promotion to
/// reject, matching how the typed model treats them.
fn is_blank(candidate: &Candidate, key: &str) -> bool {
    match candidate.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Keeps only known vocabulary entries; anything else (including a non-list
/// value) collapses towards the `["tbc"]` fallback.
fn sanitize_enum_list(candidate: &mut Candidate, key: &str, is_valid: impl Fn(&str) -> bool) {
    let kept: Vec<Value> = match candidate.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|value| is_valid(value))
            .map(|value| Value::String(value.to_string()))
            .collect(),
        _ => Vec::new(),
    };
    if kept.is_empty() {
        candidate.set(key, vec![Value::String("tbc".to_string())]);
    } else {
        candidate.set(key, kept);
    }
}

fn backfill_geography(candidate: &mut Candidate, geo: &dyn GeoLookup) {
    let Some(postcode) = candidate
        .get_str("location_postcode")
        .filter(|p| !p.is_empty())
        .map(str::to_string)
    else {
        return;
    };
    let Some(place) = geo.lookup(&postcode) else {
        return;
    };
    if !candidate.has_text("location_borough") {
        candidate.set("location_borough", place.borough.as_str());
    }
    if !candidate.has_text("location_neighbourhood") {
        candidate.set("location_neighbourhood", place.neighbourhood.as_str());
    }
}

fn truncate_vibes(candidate: &mut Candidate) {
    let trimmed = match candidate.get("vibes_tags") {
        Some(Value::Array(tags)) if tags.len() > MAX_VIBES_TAGS => {
            Some(tags[..MAX_VIBES_TAGS].to_vec())
        }
        _ => None,
    };
    if let Some(tags) = trimmed {
        candidate.set("vibes_tags", tags);
    }
}
