//! Provider-neutral generation requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 12_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Remote generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a follow-up conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A conversation turn appended after the primary user message.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// One generation call, before provider-specific payload shaping.
///
/// The same request shape serves plain completion and web-search calls; the
/// gateway decides per provider which parameters survive the translation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub provider: Provider,
    pub model: String,
    pub system: Option<String>,
    pub user: String,
    /// Follow-up turns after the user message, in order.
    pub extra_turns: Vec<ChatTurn>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Provider-specific response format hint, e.g. OpenAI's `json_object`.
    pub response_format: Option<Value>,
    /// Caller-supplied tool definitions. Only the OpenAI path sends these;
    /// the Anthropic tools slot is reserved for the web-search server tool.
    pub tools: Option<Value>,
    pub enable_web_search: bool,
    /// Provider-specific search options, passed through as-is.
    pub web_search_options: Option<Value>,
}

impl GenerationRequest {
    pub fn new(provider: Provider, model: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system: None,
            user: user.into(),
            extra_turns: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            response_format: None,
            tools: None,
            enable_web_search: false,
            web_search_options: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_turn(mut self, role: ChatRole, text: impl Into<String>) -> Self {
        self.extra_turns.push(ChatTurn {
            role,
            text: text.into(),
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_response_format(mut self, format: Option<Value>) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_tools(mut self, tools: Value) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_web_search(mut self, options: Option<Value>) -> Self {
        self.enable_web_search = true;
        self.web_search_options = options;
        self
    }
}
