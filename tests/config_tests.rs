//! Unit tests for configuration parsing and validation

use ethereum_types::U256;
use orchestrator::config::OrchestratorConfig;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::create_default_config;

const FULL_CONFIG: &str = r#"
[service]
control_plane_url = "http://127.0.0.1:3333"
attestation_url = "http://127.0.0.1:3334"
account_service_url = "http://127.0.0.1:3335"
request_timeout_secs = 10
poll_interval_secs = 2
finality_timeout_secs = 60
max_track_attempts = 40

[signer]
key_env = "MY_SIGNER_KEY"
key_file = "config/signer.key"

[policy]
default_max_fee = "5000000"

[[domain]]
name = "base"
domain = 6

[[domain]]
name = "avalanche"
domain = 1
"#;

const MINIMAL_CONFIG: &str = r#"
[service]
control_plane_url = "http://127.0.0.1:3333"
attestation_url = "http://127.0.0.1:3334"
account_service_url = "http://127.0.0.1:3335"

[signer]

[[domain]]
name = "base"
domain = 6
"#;

/// What is tested: a full config file parses with every field populated
/// Why: Ensure the TOML section and [[domain]] table shapes are right
#[test]
fn test_parse_full_config() {
    let config: OrchestratorConfig = toml::from_str(FULL_CONFIG).unwrap();
    config.validate().unwrap();

    assert_eq!(config.service.control_plane_url, "http://127.0.0.1:3333");
    assert_eq!(config.service.poll_interval_secs, 2);
    assert_eq!(config.service.max_track_attempts, 40);
    assert_eq!(config.signer.key_env, "MY_SIGNER_KEY");
    assert_eq!(config.signer.key_file.as_deref(), Some("config/signer.key"));
    assert_eq!(config.default_max_fee().unwrap(), U256::from(5_000_000u64));
    assert_eq!(config.domain.len(), 2);
    assert_eq!(config.get_domain(6).unwrap().name, "base");
    assert!(config.get_domain(99).is_none());
}

/// What is tested: a minimal config gets the documented defaults
/// Why: Intervals, timeouts, key lookup, and fee policy all have defaults
#[test]
fn test_parse_minimal_config_defaults() {
    let config: OrchestratorConfig = toml::from_str(MINIMAL_CONFIG).unwrap();
    config.validate().unwrap();

    assert_eq!(config.service.request_timeout_secs, 30);
    assert_eq!(config.service.poll_interval_secs, 3);
    assert_eq!(config.service.finality_timeout_secs, 120);
    assert_eq!(config.service.max_track_attempts, 100);
    assert_eq!(config.signer.key_env, "ORCHESTRATOR_SIGNER_KEY");
    assert!(config.signer.key_file.is_none());
    assert_eq!(config.policy.default_max_fee, "1000000");
}

/// What is tested: validation rejects a config without domains
/// Why: The orchestrator cannot route items without a domain table
#[test]
fn test_validate_requires_domain() {
    let config = OrchestratorConfig {
        domain: Vec::new(),
        ..create_default_config()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("[[domain]]"));
}

/// What is tested: validation rejects duplicate domain ids
/// Why: Routing by domain id must be unambiguous
#[test]
fn test_validate_rejects_duplicate_domains() {
    let mut config = create_default_config();
    let mut duplicate = config.domain[0].clone();
    duplicate.name = "other".to_string();
    config.domain.push(duplicate);

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("same domain id"));
}

/// What is tested: validation rejects a non-decimal fee policy
/// Why: A bad fee default must fail at startup, not mid-batch
#[test]
fn test_validate_rejects_bad_fee() {
    let mut config = create_default_config();
    config.policy.default_max_fee = "not-a-number".to_string();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("default_max_fee"));
}

/// What is tested: load_from_path() errors for a missing file
/// Why: The error should point the operator at the template
#[test]
fn test_load_missing_file() {
    let err = OrchestratorConfig::load_from_path(Some("/nonexistent/orchestrator.toml"))
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
