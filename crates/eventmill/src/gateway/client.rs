//! HTTP transport to the generation providers.
//!
//! One [`HttpGateway`] serves both providers from a shared connection pool.
//! Requests are shaped per provider: OpenAI takes a flat chat message list
//! and, in web-search mode, loses every sampling parameter except
//! `max_tokens`; Anthropic takes the system text at the top level, content
//! blocks in the message, and search as a server-side tool. Transient
//! failures are retried with doubling backoff; the last attempt's error is
//! surfaced unchanged.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::error::GatewayError;
use super::request::{GenerationRequest, Provider};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_WEB_SEARCH_TOOL: &str = "web_search_20250305";
const DEFAULT_WEB_SEARCH_MAX_USES: u64 = 5;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_secs(4);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A backend that can turn a [`GenerationRequest`] into text.
///
/// The pipeline only sees this trait; tests substitute a scripted stub.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;
}

pub struct HttpGateway {
    client: Client,
    openai_key: Option<SecretString>,
    anthropic_key: Option<SecretString>,
    openai_url: String,
    anthropic_url: String,
}

impl HttpGateway {
    /// Creates a gateway against the public provider endpoints. A missing
    /// key only fails once a request targets that provider.
    pub fn new(
        openai_key: Option<SecretString>,
        anthropic_key: Option<SecretString>,
    ) -> Result<Self, GatewayError> {
        Self::with_endpoints(
            openai_key,
            anthropic_key,
            OPENAI_API_URL.to_string(),
            ANTHROPIC_API_URL.to_string(),
        )
    }

    /// Creates a gateway against custom endpoints, e.g. a relay proxy.
    pub fn with_endpoints(
        openai_key: Option<SecretString>,
        anthropic_key: Option<SecretString>,
        openai_url: String,
        anthropic_url: String,
    ) -> Result<Self, GatewayError> {
        // Per-request timeouts are applied at send time, so the client only
        // bounds connection establishment here.
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(GatewayError::ClientBuild)?;
        Ok(Self {
            client,
            openai_key,
            anthropic_key,
            openai_url,
            anthropic_url,
        })
    }

    fn key_for(&self, provider: Provider) -> Result<&SecretString, GatewayError> {
        let key = match provider {
            Provider::OpenAi => self.openai_key.as_ref(),
            Provider::Anthropic => self.anthropic_key.as_ref(),
        };
        key.ok_or(GatewayError::MissingKey { provider })
    }

    async fn send_once(
        &self,
        request: &GenerationRequest,
        key: &SecretString,
    ) -> Result<String, GatewayError> {
        match request.provider {
            Provider::OpenAi => self.send_openai(request, key).await,
            Provider::Anthropic => self.send_anthropic(request, key).await,
        }
    }

    async fn send_openai(
        &self,
        request: &GenerationRequest,
        key: &SecretString,
    ) -> Result<String, GatewayError> {
        let payload = openai_payload(request);
        let mut builder = self
            .client
            .post(&self.openai_url)
            .bearer_auth(key.expose_secret())
            .json(&payload);
        if !request.enable_web_search {
            builder = builder.timeout(request.timeout);
        }
        let response = builder.send().await.map_err(|source| {
            GatewayError::Transport {
                provider: request.provider,
                source,
            }
        })?;
        let value = read_json(request.provider, response).await?;
        extract_openai_text(request.provider, &value)
    }

    async fn send_anthropic(
        &self,
        request: &GenerationRequest,
        key: &SecretString,
    ) -> Result<String, GatewayError> {
        let payload = anthropic_payload(request);
        let response = self
            .client
            .post(&self.anthropic_url)
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                provider: request.provider,
                source,
            })?;
        let value = read_json(request.provider, response).await?;
        Ok(extract_anthropic_text(&value))
    }
}

#[async_trait]
impl GenerationClient for HttpGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let key = self.key_for(request.provider)?;

        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..MAX_ATTEMPTS {
            match self.send_once(request, key).await {
                Ok(text) => {
                    debug!(
                        "{} responded with {} chars on attempt {attempt}",
                        request.provider,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(error) => {
                    warn!(
                        "{} attempt {attempt}/{MAX_ATTEMPTS} failed, retrying in {}s: {}",
                        request.provider,
                        backoff.as_secs(),
                        error.summary()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
        self.send_once(request, key).await
    }
}

async fn read_json(
    provider: Provider,
    response: reqwest::Response,
) -> Result<Value, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|error| GatewayError::MalformedResponse {
            provider,
            detail: error.to_string(),
        })
}

fn chat_messages(request: &GenerationRequest) -> Vec<Value> {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": request.user}));
    for turn in &request.extra_turns {
        messages.push(json!({"role": turn.role.as_str(), "content": turn.text}));
    }
    messages
}

fn openai_payload(request: &GenerationRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(request.model));
    body.insert("messages".to_string(), Value::Array(chat_messages(request)));
    body.insert("max_tokens".to_string(), json!(request.max_tokens));
    if request.enable_web_search {
        // Search-preview models reject sampling parameters and tools, so
        // only the search options and the token budget survive.
        body.insert(
            "web_search_options".to_string(),
            request.web_search_options.clone().unwrap_or_else(|| json!({})),
        );
    } else {
        body.insert("temperature".to_string(), json!(request.temperature));
        if let Some(format) = &request.response_format {
            body.insert("response_format".to_string(), format.clone());
        }
        if let Some(tools) = &request.tools {
            body.insert("tools".to_string(), tools.clone());
        }
    }
    Value::Object(body)
}

fn anthropic_payload(request: &GenerationRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(request.model));
    body.insert("max_tokens".to_string(), json!(request.max_tokens));
    body.insert("temperature".to_string(), json!(request.temperature));
    let mut messages = vec![json!({
        "role": "user",
        "content": [{"type": "text", "text": request.user}],
    })];
    for turn in &request.extra_turns {
        messages.push(json!({
            "role": turn.role.as_str(),
            "content": [{"type": "text", "text": turn.text}],
        }));
    }
    body.insert("messages".to_string(), Value::Array(messages));
    if let Some(system) = &request.system {
        body.insert("system".to_string(), json!(system));
    }
    if request.enable_web_search {
        body.insert(
            "tools".to_string(),
            json!([anthropic_search_tool(request.web_search_options.as_ref())]),
        );
    }
    Value::Object(body)
}

/// Builds the server-side search tool, folding caller options over the
/// defaults so `max_uses` and `user_location` can be tuned from config.
fn anthropic_search_tool(options: Option<&Value>) -> Value {
    let mut tool = Map::new();
    tool.insert("type".to_string(), json!(ANTHROPIC_WEB_SEARCH_TOOL));
    tool.insert("name".to_string(), json!("web_search"));
    tool.insert("max_uses".to_string(), json!(DEFAULT_WEB_SEARCH_MAX_USES));
    if let Some(Value::Object(extra)) = options {
        for (name, value) in extra {
            tool.insert(name.clone(), value.clone());
        }
    }
    Value::Object(tool)
}

fn extract_openai_text(provider: Provider, value: &Value) -> Result<String, GatewayError> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::MalformedResponse {
            provider,
            detail: "no message content in first choice".to_string(),
        })
}

/// Concatenates the text blocks of a response. Tool-use and search-result
/// blocks are skipped; a response with no text blocks yields an empty string.
fn extract_anthropic_text(value: &Value) -> String {
    value
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
