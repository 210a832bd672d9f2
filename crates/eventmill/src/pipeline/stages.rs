//! The three generation stages: extraction, web search and refinement.
//!
//! Each stage builds its prompts, wraps the remote call in the disk cache,
//! and parses the response into something the runner can sequence. Malformed
//! responses are parsing outcomes here, not errors: extraction output that
//! cannot be parsed yields zero candidates and refinement output that cannot
//! be parsed yields no patch. Only the gateway itself can fail a stage.

use log::{debug, warn};
use serde_json::Value;

use crate::cache::{CacheKey, DiskCache};
use crate::config::ModelProfile;
use crate::gateway::{GatewayError, GenerationClient, GenerationRequest};
use crate::message::{short_id, SourceMessage};
use crate::model::Candidate;

use super::preprocess::strip_json_fences;
use super::prompts;

/// Extraction and refinement want near-deterministic output.
const STRICT_TEMPERATURE: f64 = 0.1;
/// Search responses carry tool-use rounds and can run long.
const SEARCH_MAX_TOKENS: u32 = 16_384;

/// Runs the extraction call for one preprocessed message body and parses the
/// response into loose candidates.
///
/// A response that is not valid JSON, or that lacks an `events` array, is
/// logged and treated as zero candidates. Gateway failures propagate.
pub async fn run_extraction(
    client: &dyn GenerationClient,
    cache: &DiskCache,
    profile: &ModelProfile,
    message: &SourceMessage,
    body: &str,
) -> Result<Vec<Candidate>, GatewayError> {
    let system = prompts::extraction_system_prompt();
    let user = prompts::extraction_user_prompt(message, body);
    let request = GenerationRequest::new(profile.provider, &profile.model, &user)
        .with_system(&system)
        .with_temperature(STRICT_TEMPERATURE)
        .with_response_format(profile.response_format.clone());

    let key = CacheKey::new()
        .arg("provider", &profile.provider)
        .arg("model", &profile.model)
        .arg("system", &system)
        .arg("user", &user)
        .arg("temperature", &STRICT_TEMPERATURE);
    let raw = cache
        .get_or_compute("extraction", &key, || async {
            client.generate(&request).await.map(Some)
        })
        .await?;
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    Ok(parse_extraction(&raw, message))
}

fn parse_extraction(raw: &str, message: &SourceMessage) -> Vec<Candidate> {
    let cleaned = strip_json_fences(raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(error) => {
            warn!(
                "extraction for message {} returned invalid JSON ({error}); treating as zero events",
                short_id(&message.message_id)
            );
            return Vec::new();
        }
    };
    let Some(events) = value.get("events").and_then(Value::as_array) else {
        warn!(
            "extraction for message {} returned no 'events' array; treating as zero events",
            short_id(&message.message_id)
        );
        return Vec::new();
    };
    let mut candidates = Vec::with_capacity(events.len());
    for entry in events {
        match Candidate::from_value(entry.clone()) {
            Some(candidate) => candidates.push(candidate),
            None => warn!(
                "extraction for message {} produced a non-object event entry; skipping it",
                short_id(&message.message_id)
            ),
        }
    }
    candidates
}

/// Runs the web-search call for one candidate.
///
/// Returns `None` when the candidate has nothing to build a query from or
/// when the search came back blank; in both cases no call is wasted on the
/// refinement stage.
pub async fn run_search(
    client: &dyn GenerationClient,
    cache: &DiskCache,
    profile: &ModelProfile,
    candidate: &Candidate,
) -> Result<Option<String>, GatewayError> {
    let query = prompts::search_query(candidate);
    if query.is_empty() {
        debug!("candidate has no searchable fields; skipping web search");
        return Ok(None);
    }
    let request = GenerationRequest::new(profile.provider, &profile.search_model, &query)
        .with_system(prompts::SEARCH_SYSTEM_PROMPT)
        .with_max_tokens(SEARCH_MAX_TOKENS)
        .with_web_search(profile.web_search_options.clone());

    let key = CacheKey::new()
        .arg("provider", &profile.provider)
        .arg("model", &profile.search_model)
        .arg("query", &query)
        .arg("options", &profile.web_search_options);
    let summary: Option<String> = cache
        .get_or_compute("search", &key, || async {
            client.generate(&request).await.map(Some)
        })
        .await?;
    Ok(summary.filter(|text| !text.trim().is_empty()))
}

/// Runs the refinement call for one candidate against its search summary.
///
/// Returns the partial update to merge into the candidate, or `None` when
/// refinement offered nothing usable.
pub async fn run_refinement(
    client: &dyn GenerationClient,
    cache: &DiskCache,
    profile: &ModelProfile,
    candidate: &Candidate,
    summary: &str,
) -> Result<Option<Candidate>, GatewayError> {
    let event_json = match serde_json::to_string(candidate) {
        Ok(json) => json,
        Err(error) => {
            warn!("candidate could not be serialized for refinement: {error}");
            return Ok(None);
        }
    };
    let system = prompts::refinement_system_prompt();
    let user = prompts::refinement_user_prompt(&event_json, summary);
    let request = GenerationRequest::new(profile.provider, &profile.model, &user)
        .with_system(&system)
        .with_temperature(STRICT_TEMPERATURE)
        .with_response_format(profile.response_format.clone());

    let key = CacheKey::new()
        .arg("provider", &profile.provider)
        .arg("model", &profile.model)
        .arg("event", candidate)
        .arg("summary", &summary);
    let raw: Option<String> = cache
        .get_or_compute("refinement", &key, || async {
            client.generate(&request).await.map(Some)
        })
        .await?;
    match raw {
        Some(raw) => Ok(parse_refinement(&raw)),
        None => Ok(None),
    }
}

fn parse_refinement(raw: &str) -> Option<Candidate> {
    let cleaned = strip_json_fences(raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(error) => {
            warn!("refinement returned invalid JSON ({error}); keeping the candidate as-is");
            return None;
        }
    };
    let Some(patch) = Candidate::from_value(value) else {
        warn!("refinement returned a non-object; keeping the candidate as-is");
        return None;
    };
    if patch.is_empty() {
        debug!("refinement returned an empty update");
        return None;
    }
    Some(patch)
}
