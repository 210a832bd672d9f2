//! Prompt construction for the three generation stages.
//!
//! All wording lives here so the stages stay mechanical. [`PROMPT_VERSION`]
//! is folded into every cache digest; bump it whenever prompt wording or the
//! refinement schema changes, otherwise re-runs silently reuse responses to
//! the old prompts.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::message::SourceMessage;
use crate::model::enums::{
    join_values, BookingType, EventType, LocationType, OccurrenceType, TargetAudience, TimeOfDay,
};
use crate::model::Candidate;

pub const PROMPT_VERSION: &str = "v2";

/// System prompt for the initial extraction call. Embeds the full field
/// glossary and every enum vocabulary so the model never has to guess at
/// allowed values.
pub fn extraction_system_prompt() -> String {
    format!(
        "You are an assistant that extracts structured event listings from London \
         event newsletters.\n\n\
         <task>\n\
         Read the newsletter in the user message and extract every distinct real-world \
         event into a JSON object with a single \"events\" array. One array element per \
         event; an empty array when the newsletter announces no events. Resolve relative \
         dates (\"this Friday\", \"next week\") against the sent date supplied with the \
         newsletter.\n\
         </task>\n\n\
         <fields>\n\
         Each event object may contain:\n\
         - \"title\" (string): the event name as announced.\n\
         - \"summary\" (string): one or two factual sentences in your own words.\n\
         - \"description_verbatim\" (string): the announcement text for this event, \
         copied verbatim and untruncated.\n\
         - \"start_date\", \"end_date\" (string, YYYY-MM-DD).\n\
         - \"start_time\", \"end_time\" (string, HH:MM:SS): only when a clock time is stated.\n\
         - \"is_all_day\" (boolean).\n\
         - \"time_of_day\" (string): one of {time_of_day}.\n\
         - \"occurrence_type\" (string): one of {occurrence_type}.\n\
         - \"recurrence_rule\" (string): an iCalendar RRULE when the event repeats on a \
         stated schedule, e.g. \"RRULE:FREQ=WEEKLY;BYDAY=WE\".\n\
         - \"location_type\" (string): one of {location_type}.\n\
         - \"location_address_verbatim\" (string): the address exactly as written.\n\
         - \"location_postcode\" (string): the UK postcode when given.\n\
         - \"location_neighbourhood\", \"location_borough\" (string).\n\
         - \"online_url\" (string): joining link for online events.\n\
         - \"cost_amount\" (number), \"cost_currency\" (string, ISO 4217).\n\
         - \"is_donation_based\", \"is_cost_tbc\" (boolean).\n\
         - \"cost_description_verbatim\" (string): the price text exactly as written.\n\
         - \"booking_type\" (string): one of {booking_type}.\n\
         - \"booking_url\", \"event_url\" (string).\n\
         - \"vibes_tags\" (array of at most five short lowercase strings).\n\
         - \"target_audiences\" (array of strings): from {target_audiences}.\n\
         - \"event_types\" (array of strings): from {event_types}.\n\
         - \"organizer_name\" (string), \"is_organizer_sender\" (boolean).\n\
         - \"parsing_confidence_score\" (number, 0.0 to 1.0): your confidence that this \
         is a real, correctly extracted event.\n\
         Use \"tbc\" where a classification is unknown. Omit fields you have no \
         evidence for rather than guessing.\n\
         </fields>\n\n\
         <output_format>\n\
         Respond with exactly one JSON object of the form {{\"events\": [...]}}. \
         No markdown fences, no commentary.\n\
         </output_format>",
        time_of_day = join_values(TimeOfDay::ALL, TimeOfDay::as_str),
        occurrence_type = join_values(OccurrenceType::ALL, OccurrenceType::as_str),
        location_type = join_values(LocationType::ALL, LocationType::as_str),
        booking_type = join_values(BookingType::ALL, BookingType::as_str),
        target_audiences = join_values(TargetAudience::ALL_VALUES, TargetAudience::as_str),
        event_types = join_values(EventType::ALL, EventType::as_str),
    )
}

/// User prompt for extraction: message metadata plus the preprocessed body.
pub fn extraction_user_prompt(message: &SourceMessage, body: &str) -> String {
    format!(
        "<newsletter>\n\
         <sender>{sender}</sender>\n\
         <subject>{subject}</subject>\n\
         <sent_date>{sent_date}</sent_date>\n\
         <body>\n{body}\n</body>\n\
         </newsletter>",
        sender = message.sender,
        subject = message.subject,
        sent_date = message.sent_at.format("%A, %d %B %Y"),
        body = body,
    )
}

pub const SEARCH_SYSTEM_PROMPT: &str =
    "You are verifying details of a London event. Search the web for the event named \
     by the user and summarise what you find about its venue, full address, postcode, \
     organizer, cost and booking or event page URL. Reply with a short factual \
     summary. If you find nothing reliable, reply with an empty message.";

/// Web-search query built from whichever of title, human-formatted date,
/// organizer and neighbourhood the candidate has.
pub fn search_query(candidate: &Candidate) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = candidate.get_str("title").filter(|t| !t.is_empty()) {
        parts.push(title.to_string());
    }
    if let Some(date) = candidate.get_str("start_date").filter(|d| !d.is_empty()) {
        // "May 01, 2025" reads better in a search query than ISO; unparseable
        // dates go in as written.
        let formatted = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| d.format("%B %d, %Y").to_string())
            .unwrap_or_else(|_| date.to_string());
        parts.push(formatted);
    }
    for key in ["organizer_name", "location_neighbourhood"] {
        if let Some(text) = candidate.get_str(key).filter(|t| !t.is_empty()) {
            parts.push(text.to_string());
        }
    }
    parts.join(" ")
}

/// System prompt for the refinement call, embedding the partial-update schema.
pub fn refinement_system_prompt() -> String {
    format!(
        "You are refining one extracted London event using a web-search summary.\n\n\
         <task>\n\
         Compare the current event JSON with the web-search summary. Return a JSON \
         object containing ONLY the fields you can fill in or correct from the \
         summary; leave out every field you would not change. Return {{}} when the \
         summary adds nothing.\n\
         </task>\n\n\
         <schema>\n{schema}\n</schema>\n\n\
         <rules>\n\
         - Enum fields must use exactly one of the allowed values, or \"tbc\".\n\
         - Never invent details the summary does not support.\n\
         - Prefer the summary over the event for addresses, postcodes and URLs.\n\
         </rules>\n\n\
         <output_format>\n\
         Respond with exactly one JSON object. No markdown fences, no commentary.\n\
         </output_format>",
        schema = refinement_schema(),
    )
}

pub fn refinement_user_prompt(event_json: &str, summary: &str) -> String {
    format!("Current Event JSON:```{event_json}```\n\nWeb Search Summary:```{summary}```")
}

/// The fields refinement may touch. Pipeline-owned fields (message id,
/// aggregator flag, confidence, verbatim description) are deliberately
/// absent so a refinement response can never overwrite them with nonsense.
pub fn refinement_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "title": {"type": "string"},
            "summary": {"type": "string"},
            "start_date": {"type": "string", "format": "date"},
            "end_date": {"type": ["string", "null"], "format": "date"},
            "start_time": {"type": ["string", "null"]},
            "end_time": {"type": ["string", "null"]},
            "is_all_day": {"type": "boolean"},
            "time_of_day": {"type": "string", "enum": wire_names(TimeOfDay::ALL, TimeOfDay::as_str)},
            "timezone": {"type": "string"},
            "occurrence_type": {"type": "string"},
            "recurrence_rule": {"type": ["string", "null"]},
            "location_type": {"type": "string", "enum": wire_names(LocationType::ALL, LocationType::as_str)},
            "location_address_verbatim": {"type": ["string", "null"]},
            "location_postcode": {"type": ["string", "null"]},
            "location_neighbourhood": {"type": ["string", "null"]},
            "location_borough": {"type": ["string", "null"]},
            "online_url": {"type": ["string", "null"]},
            "cost_amount": {"type": ["number", "null"]},
            "cost_currency": {"type": ["string", "null"]},
            "is_donation_based": {"type": "boolean"},
            "is_cost_tbc": {"type": "boolean"},
            "cost_description_verbatim": {"type": ["string", "null"]},
            "booking_type": {"type": ["string", "null"], "enum": wire_names(BookingType::ALL, BookingType::as_str)},
            "booking_url": {"type": ["string", "null"]},
            "event_url": {"type": ["string", "null"]},
            "vibes_tags": {"type": "array", "items": {"type": "string"}, "maxItems": 5},
            "target_audiences": {
                "type": "array",
                "items": {"type": "string", "enum": wire_names(TargetAudience::ALL_VALUES, TargetAudience::as_str)},
            },
            "event_types": {
                "type": "array",
                "items": {"type": "string", "enum": wire_names(EventType::ALL, EventType::as_str)},
            },
            "organizer_name": {"type": ["string", "null"]},
            "is_organizer_sender": {"type": ["boolean", "null"]},
        },
    })
}

fn wire_names<T>(values: &[T], as_str: impl Fn(&T) -> &'static str) -> Vec<&'static str> {
    values.iter().map(as_str).collect()
}
