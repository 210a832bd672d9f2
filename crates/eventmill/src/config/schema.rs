use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::gateway::Provider;
use crate::pipeline::{gate, prompts};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub geo: GeoConfig,
}

impl Config {
    /// The resolved generation profile for the configured provider:
    /// built-in per-provider defaults with any model-id overrides applied.
    pub fn model_profile(&self) -> ModelProfile {
        let mut profile = match self.provider {
            Provider::Anthropic => ModelProfile::anthropic(),
            Provider::OpenAi => ModelProfile::openai(),
        };
        if let Some(model) = &self.models.generation {
            profile.model = model.clone();
        }
        if let Some(model) = &self.models.search {
            profile.search_model = model.clone();
        }
        profile
    }
}

fn default_provider() -> Provider {
    Provider::Anthropic
}

/// Model-id overrides. The full per-provider profiles (response format,
/// search options) live in code; config only swaps model names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Everything the stages need to shape requests for one provider.
#[derive(Debug, Clone)]
pub struct ModelProfile {
    pub provider: Provider,
    pub model: String,
    pub search_model: String,
    /// Passed through on plain completion calls; OpenAI's JSON mode.
    pub response_format: Option<Value>,
    /// Passed through on web-search calls.
    pub web_search_options: Option<Value>,
}

impl ModelProfile {
    pub fn anthropic() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: "claude-3-7-sonnet-latest".to_string(),
            search_model: "claude-3-7-sonnet-latest".to_string(),
            response_format: None,
            web_search_options: Some(json!({
                "max_uses": 5,
                "user_location": {"type": "approximate", "city": "London", "country": "GB"},
            })),
        }
    }

    pub fn openai() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "gpt-4o".to_string(),
            search_model: "gpt-4o-mini-search-preview".to_string(),
            response_format: Some(json!({"type": "json_object"})),
            web_search_options: Some(json!({
                "search_context_size": "medium",
                "user_location": {"type": "approximate", "approximate": {"country": "GB"}},
            })),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Bodies longer than this (in characters) are marked `body_too_large`
    /// without any generation call.
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Redirect hosts whose links are resolved before extraction.
    #[serde(default = "default_tracker_domains")]
    pub tracker_domains: Vec<String>,
}

fn default_batch_size() -> u32 {
    10
}

fn default_max_body_chars() -> usize {
    40_000
}

fn default_min_confidence() -> f64 {
    gate::DEFAULT_MIN_CONFIDENCE
}

fn default_tracker_domains() -> Vec<String> {
    ["list-manage.com", "mailchi.mp", "ct.sendgrid.net"]
        .iter()
        .map(|domain| domain.to_string())
        .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_body_chars: default_max_body_chars(),
            min_confidence: default_min_confidence(),
            tracker_domains: default_tracker_domains(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Defaults to `~/.eventmill/cache`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Folded into every cache digest; defaults to the built-in prompt
    /// version so editing prompts in code invalidates the cache.
    #[serde(default)]
    pub prompt_version: Option<String>,
}

impl CacheConfig {
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory.clone().or_else(default_cache_directory)
    }

    pub fn resolved_prompt_version(&self) -> String {
        self.prompt_version
            .clone()
            .unwrap_or_else(|| prompts::PROMPT_VERSION.to_string())
    }
}

pub fn default_cache_directory() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".eventmill").join("cache"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Defaults to `~/.eventmill/data/eventmill.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoConfig {
    /// CSV postcode table; geography backfill is disabled when unset.
    #[serde(default)]
    pub postcode_data_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        crate::config::load_config_from_str(r#"{"version": "1.0"}"#).unwrap()
    }

    #[test]
    fn test_defaults_select_anthropic() {
        let config = minimal_config();
        assert_eq!(config.provider, Provider::Anthropic);
        let profile = config.model_profile();
        assert_eq!(profile.model, "claude-3-7-sonnet-latest");
        assert!(profile.response_format.is_none());
        assert_eq!(profile.web_search_options.unwrap()["max_uses"], 5);
    }

    #[test]
    fn test_openai_profile_carries_json_mode_and_search_model() {
        let mut config = minimal_config();
        config.provider = Provider::OpenAi;
        let profile = config.model_profile();
        assert_eq!(profile.model, "gpt-4o");
        assert_eq!(profile.search_model, "gpt-4o-mini-search-preview");
        assert_eq!(profile.response_format.unwrap()["type"], "json_object");
    }

    #[test]
    fn test_model_overrides_apply_to_the_active_profile() {
        let mut config = minimal_config();
        config.models.generation = Some("claude-4-test".to_string());
        config.models.search = Some("claude-4-search".to_string());
        let profile = config.model_profile();
        assert_eq!(profile.model, "claude-4-test");
        assert_eq!(profile.search_model, "claude-4-search");
    }

    #[test]
    fn test_pipeline_defaults() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.batch_size, 10);
        assert_eq!(pipeline.max_body_chars, 40_000);
        assert_eq!(pipeline.min_confidence, 0.40);
        assert!(pipeline
            .tracker_domains
            .contains(&"list-manage.com".to_string()));
    }

    #[test]
    fn test_cache_resolution_prefers_explicit_values() {
        let cache = CacheConfig {
            directory: Some(PathBuf::from("/tmp/mill-cache")),
            prompt_version: Some("frozen".to_string()),
        };
        assert_eq!(
            cache.resolved_directory(),
            Some(PathBuf::from("/tmp/mill-cache"))
        );
        assert_eq!(cache.resolved_prompt_version(), "frozen");

        let defaults = CacheConfig::default();
        assert_eq!(defaults.resolved_prompt_version(), prompts::PROMPT_VERSION);
    }
}
