#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use eventmill::cache::DiskCache;
use eventmill::config::load_config_from_str;
use eventmill::gateway::{GatewayError, GenerationClient, GenerationRequest};
use eventmill::geo::{GeoLookup, NoGeo};
use eventmill::model::Event;
use eventmill::pipeline::Pipeline;
use eventmill::store::{event_repo, ledger_repo, message_repo, Database, SqliteStore};
use eventmill::SourceMessage;

/// A generation backend that replays scripted responses in order.
///
/// Every request is recorded so tests can assert on the prompts the
/// pipeline actually sent. Once the script runs out, further calls
/// return an empty string, which the stages treat as malformed output.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// How many generation calls the pipeline made.
    pub fn calls(&self) -> usize {
        self.seen.lock().expect("client lock").len()
    }

    /// The nth request the pipeline sent, in call order.
    pub fn request(&self, index: usize) -> GenerationRequest {
        self.seen.lock().expect("client lock")[index].clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        self.seen.lock().expect("client lock").push(request.clone());
        self.responses
            .lock()
            .expect("client lock")
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Builds a [`TestHarness`] with scripted responses and optional overrides.
pub struct HarnessBuilder {
    config_json: String,
    responses: Vec<Result<String, GatewayError>>,
    cache_path: Option<PathBuf>,
    geo: Option<Arc<dyn GeoLookup>>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config_json: r#"{"version": "1.0"}"#.to_string(),
            responses: Vec::new(),
            cache_path: None,
            geo: None,
        }
    }

    /// Replaces the default minimal configuration.
    pub fn config(mut self, json: &str) -> Self {
        self.config_json = json.to_string();
        self
    }

    /// Scripts the next successful generation response.
    pub fn reply(mut self, text: &str) -> Self {
        self.responses.push(Ok(text.to_string()));
        self
    }

    /// Scripts the next generation call to fail.
    pub fn fail(mut self, error: GatewayError) -> Self {
        self.responses.push(Err(error));
        self
    }

    /// Points the response cache at an existing directory instead of a
    /// fresh temporary one, so two harnesses can share cached entries.
    pub fn cache_path(mut self, path: &Path) -> Self {
        self.cache_path = Some(path.to_path_buf());
        self
    }

    pub fn geo(mut self, geo: Arc<dyn GeoLookup>) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn build(self) -> TestHarness {
        let config = load_config_from_str(&self.config_json).expect("Failed to load test config");
        let client = Arc::new(ScriptedClient::new(self.responses));
        let store = Arc::new(SqliteStore::new(
            Database::open_in_memory().expect("Failed to open test database"),
        ));

        let cache_dir = TempDir::new().expect("Failed to create cache directory");
        let cache_root = self
            .cache_path
            .unwrap_or_else(|| cache_dir.path().to_path_buf());
        let cache = DiskCache::new(cache_root, "test");

        let geo = self.geo.unwrap_or_else(|| Arc::new(NoGeo));
        let pipeline = Pipeline::new(
            Arc::new(config),
            client.clone(),
            cache,
            store.clone(),
            store.clone(),
            geo,
        )
        .expect("Failed to build pipeline");

        TestHarness {
            pipeline,
            store,
            client,
            _cache_dir: cache_dir,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline wired to an in-memory database, a scripted generation
/// client and a temporary response cache.
pub struct TestHarness {
    pub pipeline: Pipeline,
    pub store: Arc<SqliteStore>,
    pub client: Arc<ScriptedClient>,
    _cache_dir: TempDir,
}

impl TestHarness {
    pub fn with_responses(responses: Vec<Result<String, GatewayError>>) -> Self {
        let mut builder = HarnessBuilder::new();
        builder.responses = responses;
        builder.build()
    }

    /// Seeds a message into the store, as ingest would.
    pub fn ingest(&self, message: &SourceMessage) {
        message_repo::insert(self.store.database(), message).expect("Failed to insert message");
    }

    /// The ledger marker for a message: `(processed_ok, note)`.
    pub fn ledger(&self, message_id: &str) -> Option<(bool, String)> {
        ledger_repo::find(self.store.database(), message_id)
            .expect("Failed to read ledger")
            .map(|entry| (entry.processed_ok, entry.note))
    }

    /// Events saved for a message, oldest first.
    pub fn events_for(&self, message_id: &str) -> Vec<Event> {
        event_repo::find_by_message(self.store.database(), message_id)
            .expect("Failed to read events")
    }
}
