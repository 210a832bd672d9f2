//! Recurrence rule canonicalization.
//!
//! Generated output carries RRULEs in assorted shapes: missing the `RRULE:`
//! prefix, with extended-ISO `UNTIL` timestamps, or with no terminating bound
//! at all. [`normalize_rule`] folds all of those into one canonical, bounded
//! form; a rule that still fails the grammar afterwards is rejected.
//!
//! The supported grammar is a restricted RFC 5545 subset: `FREQ` of
//! DAILY/WEEKLY/MONTHLY/YEARLY, then optionally `INTERVAL`, `BYDAY` (plain
//! weekday codes, no ordinal prefixes), `BYMONTHDAY`, and `COUNT` or `UNTIL`,
//! in that order.

use chrono::{Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use super::error::ValidationError;

// Pre-compiled regexes for the supported RRULE grammar
static RE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:RRULE:)?FREQ=(DAILY|WEEKLY|MONTHLY|YEARLY)(;INTERVAL=\d+)?(;BYDAY=(?:MO|TU|WE|TH|FR|SA|SU)(?:,(?:MO|TU|WE|TH|FR|SA|SU))*)?(;BYMONTHDAY=-?\d{1,2})?(;COUNT=\d+|;UNTIL=(?:\d{8}|\d{4}-\d{2}-\d{2})(?:T\d{6}Z?)?)?$",
    )
    .unwrap()
});
static RE_UNTIL_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UNTIL=(\d{4})-(\d{2})-(\d{2})(?:T(\d{2}):(\d{2}):(\d{2})(Z?))?").unwrap()
});
static RE_UNTIL_COMPACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"UNTIL=(\d{8})").unwrap());

/// Days ahead of the start date used to bound an open-ended rule.
const DEFAULT_BOUND_DAYS: u64 = 365;

/// Canonicalizes a raw recurrence rule.
///
/// Prefixes `RRULE:` when absent, rewrites extended-ISO `UNTIL` values into
/// the compact form, validates against the supported grammar and, when the
/// rule carries neither `COUNT` nor `UNTIL`, injects an `UNTIL` one year past
/// `start_date`. A rule needing that bound without a known start date is an
/// error.
pub fn normalize_rule(
    raw: &str,
    start_date: Option<NaiveDate>,
) -> Result<String, ValidationError> {
    let mut rule = raw.trim().to_string();
    if !rule.starts_with("RRULE:") {
        rule = format!("RRULE:{rule}");
    }

    rule = RE_UNTIL_ISO
        .replace(&rule, |caps: &regex::Captures<'_>| {
            let date = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
            match (caps.get(4), caps.get(5), caps.get(6)) {
                (Some(h), Some(m), Some(s)) => {
                    let zulu = caps.get(7).map_or("", |z| z.as_str());
                    format!("UNTIL={date}T{}{}{}{zulu}", h.as_str(), m.as_str(), s.as_str())
                }
                _ => format!("UNTIL={date}"),
            }
        })
        .into_owned();

    if !RE_RULE.is_match(&rule) {
        return Err(ValidationError::InvalidRecurrenceRule { rule });
    }

    if !has_bound(&rule) {
        let start = start_date.ok_or(ValidationError::UnboundedRuleWithoutStartDate)?;
        let until = start + Days::new(DEFAULT_BOUND_DAYS);
        rule.push_str(&format!(";UNTIL={}", until.format("%Y%m%d")));
    }

    Ok(rule)
}

/// Whether the rule carries a terminating `COUNT` or `UNTIL` part.
pub fn has_bound(rule: &str) -> bool {
    rule.contains("COUNT=") || rule.contains("UNTIL=")
}

/// Appends an `UNTIL` bound in compact date form.
pub fn with_until(rule: &str, until: NaiveDate) -> String {
    format!("{rule};UNTIL={}", until.format("%Y%m%d"))
}

/// Extracts the date component of an `UNTIL` bound, if one is present.
///
/// An `UNTIL` whose eight leading digits do not form a real calendar date is
/// reported as an invalid rule rather than silently ignored.
pub fn until_date(rule: &str) -> Result<Option<NaiveDate>, ValidationError> {
    match RE_UNTIL_COMPACT.captures(rule) {
        None => Ok(None),
        Some(caps) => NaiveDate::parse_from_str(&caps[1], "%Y%m%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidRecurrenceRule {
                rule: rule.to_string(),
            }),
    }
}
