//! Table-driven tests for configuration loading, plus the disk-backed
//! pipeline bootstrap that consumes a loaded config.

use std::sync::Arc;

use serial_test::serial;
use tempfile::TempDir;

use eventmill::config::{load_config, load_config_from_str};
use eventmill::pipeline::Pipeline;
use eventmill::{ConfigError, EventmillError};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{"version": "1.0"}"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "provider": "anthropic",
            "models": {
                "generation": "claude-3-5-haiku-latest",
                "search": "claude-3-7-sonnet-latest"
            },
            "pipeline": {
                "batch_size": 5,
                "max_body_chars": 40000,
                "min_confidence": 0.55,
                "tracker_domains": ["link.example.org"]
            },
            "cache": {
                "directory": "/var/cache/eventmill",
                "prompt_version": "v3"
            },
            "store": {
                "database_path": "/var/lib/eventmill/events.db"
            },
            "geo": {
                "postcode_data_path": "/usr/share/eventmill/postcodes.csv"
            }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{"version": "2.0"}"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "unknown_provider",
        config_json: r#"{"version": "1.0", "provider": "mistral"}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "misspelled_section",
        config_json: r#"{"version": "1.0", "piepline": {"batch_size": 5}}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "confidence_above_one",
        config_json: r#"{"version": "1.0", "pipeline": {"min_confidence": 1.5}}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "zero_batch_size",
        config_json: r#"{"version": "1.0", "pipeline": {"batch_size": 0}}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "tracker_domains_not_an_array",
        config_json: r#"{"version": "1.0", "pipeline": {"tracker_domains": "link.example.org"}}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "not_json_at_all",
        config_json: "events this week",
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
];

#[test]
fn test_config_loading_cases() {
    for test_case in CONFIG_TESTS {
        let result = load_config_from_str(test_case.config_json);

        if test_case.should_succeed {
            assert!(
                result.is_ok(),
                "Test '{}': Expected success but got error: {:?}",
                test_case.name,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Test '{}': Expected error but got success",
                test_case.name
            );

            if let Some(expected_error) = test_case.expected_error {
                let error_msg = result.err().map(|e| e.to_string()).unwrap_or_default();
                assert!(
                    error_msg.contains(expected_error),
                    "Test '{}': Expected error containing '{}', got '{}'",
                    test_case.name,
                    expected_error,
                    error_msg
                );
            }
        }
    }
}

#[test]
fn test_config_loads_from_a_file() {
    let dir = TempDir::new().expect("config dir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "version": "1.0",
            "provider": "openai",
            "pipeline": {"batch_size": 3},
            "cache": {"prompt_version": "v7"}
        }"#,
    )
    .expect("write config");

    let config = load_config(&path).expect("config should load");

    assert_eq!(config.pipeline.batch_size, 3);
    assert_eq!(config.cache.resolved_prompt_version(), "v7");
    assert_eq!(config.model_profile().model, "gpt-4o");
}

#[test]
fn test_missing_config_file_reports_the_path() {
    let dir = TempDir::new().expect("config dir");
    let path = dir.path().join("absent.json");

    let error = load_config(&path).expect_err("missing file must fail");

    assert!(matches!(error, ConfigError::ReadFile { .. }));
    assert!(error.to_string().contains("absent.json"));
}

// ── Pipeline bootstrap ──

#[test]
#[serial]
fn test_from_config_builds_a_pipeline_from_disk_paths() {
    let dir = TempDir::new().expect("state dir");
    let db_path = dir.path().join("events.db");
    let config_json = serde_json::json!({
        "version": "1.0",
        "cache": {"directory": dir.path().join("cache")},
        "store": {"database_path": db_path},
    });

    std::env::set_var("ANTHROPIC_API_KEY", "test-key");
    let config = load_config_from_str(&config_json.to_string()).expect("config should load");
    let result = Pipeline::from_config(Arc::new(config));
    std::env::remove_var("ANTHROPIC_API_KEY");

    result.expect("pipeline should build");
    // Opening the store created the database file under the state dir.
    assert!(dir.path().join("events.db").exists());
}

#[test]
#[serial]
fn test_from_config_requires_the_provider_credential() {
    std::env::remove_var("OPENAI_API_KEY");
    std::env::remove_var("ANTHROPIC_API_KEY");
    let config = load_config_from_str(r#"{"version": "1.0"}"#).expect("config should load");

    let error = Pipeline::from_config(Arc::new(config)).expect_err("missing key must fail");

    assert!(matches!(
        error,
        EventmillError::Config(ConfigError::MissingCredential { .. })
    ));
    assert!(error.to_string().contains("ANTHROPIC_API_KEY"));
}
