use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::cache::DiskCache;
use crate::config::{Config, ModelProfile};
use crate::error::{ConfigError, EventmillError};
use crate::gateway::{GenerationClient, HttpGateway, Provider};
use crate::geo::{GeoLookup, NoGeo, PostcodeTable};
use crate::message::{short_id, SourceMessage};
use crate::model::{Candidate, Event};
use crate::store::{default_database_path, Database, EventStore, MessageSource, SqliteStore};

use super::context::{BatchSummary, MessageOutcome};
use super::error::{DropReason, PipelineError};
use super::gate::{self, GatePolicy};
use super::links::LinkResolver;
use super::normalize;
use super::preprocess;
use super::stages;

/// The wired extraction pipeline.
///
/// Owns every sub-component and runs stored messages through the fixed step
/// sequence: skip checks, body preprocessing, extraction, per-candidate
/// enrichment, normalization, the completeness gate, persistence.
pub struct Pipeline {
    config: Arc<Config>,
    profile: ModelProfile,
    gate: GatePolicy,
    client: Arc<dyn GenerationClient>,
    cache: DiskCache,
    source: Arc<dyn MessageSource>,
    store: Arc<dyn EventStore>,
    geo: Arc<dyn GeoLookup>,
    links: LinkResolver,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds a pipeline from explicit components.
    ///
    /// Tests and embedders inject doubles through here; production wiring
    /// lives in [`Pipeline::from_config`].
    pub fn new(
        config: Arc<Config>,
        client: Arc<dyn GenerationClient>,
        cache: DiskCache,
        source: Arc<dyn MessageSource>,
        store: Arc<dyn EventStore>,
        geo: Arc<dyn GeoLookup>,
    ) -> Result<Self, PipelineError> {
        let profile = config.model_profile();
        let gate = GatePolicy {
            min_confidence: config.pipeline.min_confidence,
        };
        let links = LinkResolver::new(config.pipeline.tracker_domains.clone())?;
        Ok(Self {
            config,
            profile,
            gate,
            client,
            cache,
            source,
            store,
            geo,
            links,
        })
    }

    /// Production constructor: gateway keys from the environment, SQLite
    /// storage, disk cache and the optional postcode table, all resolved
    /// from `config`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, EventmillError> {
        let openai_key = env_secret("OPENAI_API_KEY");
        let anthropic_key = env_secret("ANTHROPIC_API_KEY");
        let (required, present) = match config.provider {
            Provider::OpenAi => ("OPENAI_API_KEY", openai_key.is_some()),
            Provider::Anthropic => ("ANTHROPIC_API_KEY", anthropic_key.is_some()),
        };
        if !present {
            return Err(ConfigError::MissingCredential {
                name: required.to_string(),
            }
            .into());
        }
        let client = Arc::new(HttpGateway::new(openai_key, anthropic_key)?);

        let cache_dir =
            config
                .cache
                .resolved_directory()
                .ok_or_else(|| ConfigError::Validation {
                    message: "no cache directory configured and no home directory found"
                        .to_string(),
                })?;
        let cache = DiskCache::new(cache_dir, config.cache.resolved_prompt_version());

        let database_path = config
            .store
            .database_path
            .clone()
            .or_else(default_database_path)
            .ok_or_else(|| ConfigError::Validation {
                message: "no database path configured and no home directory found".to_string(),
            })?;
        let store = SqliteStore::new(Database::open(&database_path)?);

        let geo: Arc<dyn GeoLookup> = match &config.geo.postcode_data_path {
            Some(path) => Arc::new(PostcodeTable::load(path)?),
            None => Arc::new(NoGeo),
        };

        let pipeline = Self::new(
            config,
            client,
            cache,
            Arc::new(store.clone()),
            Arc::new(store),
            geo,
        )?;
        Ok(pipeline)
    }

    /// Fetches one batch of unprocessed messages and runs each through
    /// [`Pipeline::process_message`].
    ///
    /// A fatal error on one message is logged and counted; the rest of the
    /// batch still runs. The failed message keeps no ledger marker and is
    /// picked up again by the next invocation.
    pub async fn run_batch(&self) -> Result<BatchSummary, PipelineError> {
        let batch_size = self.config.pipeline.batch_size;
        let messages = self.source.fetch_unprocessed(batch_size)?;
        info!(fetched = messages.len(), batch_size, "batch fetched");

        let mut summary = BatchSummary {
            fetched: messages.len(),
            ..BatchSummary::default()
        };
        for message in &messages {
            match self.process_message(message).await {
                Ok(outcome) => summary.record(&outcome),
                Err(error) => {
                    warn!(
                        id = %short_id(&message.message_id),
                        "message failed and stays unmarked for retry: {error}"
                    );
                    summary.failed += 1;
                }
            }
        }
        info!(
            saved_messages = summary.saved_messages,
            saved_events = summary.saved_events,
            dropped = summary.dropped_candidates,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }

    /// Runs one stored message to a terminal outcome, ledger marker included.
    ///
    /// On `Err` nothing was marked, so a later run retries the message from
    /// scratch; the disk cache makes the retry cheap.
    pub async fn process_message(
        &self,
        message: &SourceMessage,
    ) -> Result<MessageOutcome, PipelineError> {
        let span = info_span!(
            "message",
            id = %short_id(&message.message_id),
            kind = message.source_kind.as_str(),
        );
        self.run_message(message).instrument(span).await
    }

    async fn run_message(
        &self,
        message: &SourceMessage,
    ) -> Result<MessageOutcome, PipelineError> {
        // Step 1: skip anything that must not reach generation.
        if self.store.already_parsed(&message.message_id)? {
            debug!("already parsed; skipping without touching the marker");
            return Ok(MessageOutcome::AlreadyParsed);
        }
        let body_chars = message.body.chars().count();
        if body_chars > self.config.pipeline.max_body_chars {
            info!(
                chars = body_chars,
                limit = self.config.pipeline.max_body_chars,
                "body too large for extraction"
            );
            return self.finish(message, MessageOutcome::BodyTooLarge);
        }
        if !message.is_newsletter {
            info!("not classified as a newsletter");
            return self.finish(message, MessageOutcome::NotNewsletter);
        }

        // Step 2: clean the body before it reaches the extraction prompt.
        let body = self
            .step_preprocess(message)
            .instrument(info_span!("preprocess"))
            .await;
        if body.trim().is_empty() {
            warn!("nothing left of the body after preprocessing");
            return self.finish(message, MessageOutcome::NoEvents { dropped: 0 });
        }

        // Step 3: extract loose candidates. Gateway failure is fatal here.
        let candidates = stages::run_extraction(
            self.client.as_ref(),
            &self.cache,
            &self.profile,
            message,
            &body,
        )
        .instrument(info_span!("extract"))
        .await?;
        info!(candidates = candidates.len(), "extraction finished");

        // Step 4: enrich, normalize and gate each candidate on its own.
        let mut events: Vec<Event> = Vec::new();
        let mut dropped = 0usize;
        for (index, candidate) in candidates.into_iter().enumerate() {
            let event = self
                .step_candidate(message, candidate)
                .instrument(info_span!("candidate", index))
                .await;
            match event {
                Some(event) => events.push(event),
                None => dropped += 1,
            }
        }

        // Step 5: persist the survivors and write the ledger marker.
        let outcome = if events.is_empty() {
            MessageOutcome::NoEvents { dropped }
        } else {
            self.store.save_events(&events)?;
            info!(saved = events.len(), dropped, "events saved");
            MessageOutcome::Saved {
                saved: events.len(),
                dropped,
            }
        };
        self.finish(message, outcome)
    }

    /// Body clean-up: aggregator boilerplate and tracked links first, the
    /// unsubscribe footer for everyone.
    async fn step_preprocess(&self, message: &SourceMessage) -> String {
        let mut body = message.body.clone();
        if message.source_kind.is_aggregator() {
            body = preprocess::trim_boilerplate(&body);
            body = self.links.expand_tracked_links(&body).await;
        }
        preprocess::truncate_at_unsubscribe(&body)
    }

    /// Enrichment, normalization and the completeness gate for one
    /// candidate. Returns `None` when the candidate is dropped; a drop never
    /// aborts the message.
    async fn step_candidate(
        &self,
        message: &SourceMessage,
        mut candidate: Candidate,
    ) -> Option<Event> {
        candidate.set("email_message_id", message.message_id.as_str());
        candidate.set("from_aggregator", message.source_kind.is_aggregator());

        if message.source_kind.is_aggregator() && normalize::needs_enrichment(&candidate) {
            self.step_enrich(&mut candidate).await;
        }

        let event = match normalize::repair(candidate, message, self.geo.as_ref()) {
            Ok(event) => event,
            Err(reason) => {
                warn!("dropping candidate: {reason}");
                return None;
            }
        };

        let missing = gate::incomplete_reasons(&event, &self.gate);
        if !missing.is_empty() {
            let reason = DropReason::Incomplete(missing.join(", "));
            warn!(title = %event.title, "dropping candidate: {reason}");
            return None;
        }
        Some(event)
    }

    /// Web search plus refinement. Every failure in here is logged and
    /// swallowed; the candidate simply proceeds as extracted.
    async fn step_enrich(&self, candidate: &mut Candidate) {
        let summary = match stages::run_search(
            self.client.as_ref(),
            &self.cache,
            &self.profile,
            candidate,
        )
        .await
        {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                debug!("web search had nothing to add");
                return;
            }
            Err(error) => {
                warn!("web search failed: {}", error.summary());
                return;
            }
        };

        match stages::run_refinement(
            self.client.as_ref(),
            &self.cache,
            &self.profile,
            candidate,
            &summary,
        )
        .await
        {
            Ok(Some(patch)) => candidate.merge(patch),
            Ok(None) => debug!("refinement offered no update"),
            Err(error) => warn!("refinement failed: {}", error.summary()),
        }
    }

    /// Writes the ledger marker for a terminal outcome and hands it back.
    fn finish(
        &self,
        message: &SourceMessage,
        outcome: MessageOutcome,
    ) -> Result<MessageOutcome, PipelineError> {
        if let Some((ok, note)) = outcome.ledger_entry() {
            self.store.mark_processed(&message.message_id, ok, note)?;
        }
        Ok(outcome)
    }
}

fn env_secret(name: &str) -> Option<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}
