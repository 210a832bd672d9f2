//! Body clean-up before extraction.
//!
//! Newsletter bodies carry boilerplate that wastes tokens and confuses
//! extraction: per-sender intro/outro sections, unsubscribe footers, and
//! markdown code fences around generation output. The functions here cut
//! all of that away; they are pure text transforms with no side effects.

use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regex for the unsubscribe footer boundary
static RE_UNSUBSCRIBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)unsubscribe").unwrap());

// Sender-specific boilerplate markers. Detection is on the lowercased body;
// the split markers themselves are matched verbatim.
const SCOOP_NEEDLE: &str = "london scoop";
const SCOOP_START: &str = " *EVENTS SCOOP* *.*";
const SCOOP_END: &str = "*Let me know what you think!";
const CHEAPSKATE_NEEDLE: &str = "cheapskate";
const CHEAPSKATE_END: &str = "_**And for dessert...**_";

/// Cuts known intro/outro sections from aggregator newsletters.
///
/// Each rule fires only when the sender's signature phrase appears anywhere
/// in the body, so unrelated newsletters pass through untouched.
pub fn trim_boilerplate(body: &str) -> String {
    let lowered = body.to_lowercase();
    let mut text = body;

    if lowered.contains(SCOOP_NEEDLE) {
        if let Some((_, after)) = text.split_once(SCOOP_START) {
            text = after;
        }
        if let Some((before, _)) = text.split_once(SCOOP_END) {
            text = before;
        }
    }
    if lowered.contains(CHEAPSKATE_NEEDLE) {
        if let Some((before, _)) = text.split_once(CHEAPSKATE_END) {
            text = before;
        }
    }

    text.to_string()
}

/// Truncates the body at the first case-insensitive "unsubscribe".
///
/// Everything from that word onwards is footer: list management links,
/// postal addresses, tracking pixels.
pub fn truncate_at_unsubscribe(body: &str) -> String {
    match RE_UNSUBSCRIBE.find(body) {
        Some(found) => body[..found.start()].trim_end().to_string(),
        None => body.to_string(),
    }
}

/// Strips markdown code fences and newlines from generation output.
///
/// Models wrap JSON in ```` ```json ```` fences despite instructions not
/// to; stray newlines inside string values are collapsed along with the
/// formatting ones, which the extraction prompt tolerates.
pub fn strip_json_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").replace('\n', "")
}
