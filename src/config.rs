//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the
//! orchestrator service. Configuration includes service endpoints, signing
//! key lookup, fee policy, and the known transfer domains.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all orchestrator settings.
///
/// This structure holds configuration for:
/// - Service endpoints (control plane, attestation service, account service)
/// - Polling intervals and timeouts
/// - Signing key lookup
/// - Fee policy
/// - Known transfer domains (use `[[domain]]` in TOML for multiple)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Service endpoints and timing
    pub service: ServiceConfig,
    /// Signing key lookup
    pub signer: SignerConfig,
    /// Fee policy
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Known transfer domains (use [[domain]] in TOML for multiple)
    #[serde(default)]
    pub domain: Vec<DomainConfig>,
}

/// Service-level configuration for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Control-plane API base URL (e.g., "http://127.0.0.1:3333")
    pub control_plane_url: String,
    /// Attestation service base URL (e.g., "http://127.0.0.1:3334")
    pub attestation_url: String,
    /// Smart-account execution service base URL (e.g., "http://127.0.0.1:3335")
    pub account_service_url: String,
    /// Upper bound on a single HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Interval between finality/status polls, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on one execution's finality wait, in seconds
    #[serde(default = "default_finality_timeout_secs")]
    pub finality_timeout_secs: u64,
    /// Status-poll attempt budget per operation, shared across all of an
    /// operation's signing phases
    #[serde(default = "default_max_track_attempts")]
    pub max_track_attempts: u32,
}

/// Signing key lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Environment variable checked first for the hex-encoded key
    #[serde(default = "default_key_env")]
    pub key_env: String,
    /// Fallback path to a raw hex key file
    #[serde(default)]
    pub key_file: Option<String>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            key_env: default_key_env(),
            key_file: None,
        }
    }
}

/// Fee policy configuration.
///
/// `default_max_fee` is a fixed default rather than a value derived from live
/// network conditions; deployments tune it per environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum fee accepted per intent, decimal string in the smallest
    /// token unit
    #[serde(default = "default_max_fee")]
    pub default_max_fee: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_max_fee: default_max_fee(),
        }
    }
}

/// Configuration for one transfer domain (a chain within the transfer
/// network, identified by its protocol-level domain id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Human-readable name for the domain
    pub name: String,
    /// Protocol-level domain id (distinct from the chain's native chain id)
    pub domain: u32,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_finality_timeout_secs() -> u64 {
    120
}

fn default_max_track_attempts() -> u32 {
    100
}

fn default_key_env() -> String {
    "ORCHESTRATOR_SIGNER_KEY".to_string()
}

fn default_max_fee() -> String {
    "1000000".to_string()
}

impl ServiceConfig {
    /// Per-request HTTP timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Finality timeout as a [`Duration`].
    pub fn finality_timeout(&self) -> Duration {
        Duration::from_secs(self.finality_timeout_secs)
    }
}

impl OrchestratorConfig {
    /// Loads configuration from a TOML file.
    ///
    /// This function:
    /// 1. Resolves the config path (provided path, or ORCHESTRATOR_CONFIG_PATH
    ///    env var, or the default `config/orchestrator.toml`)
    /// 2. Loads and parses the configuration
    /// 3. Validates the configuration
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to config file. If None, uses
    ///   ORCHESTRATOR_CONFIG_PATH env var or the default.
    ///
    /// # Returns
    ///
    /// * `Ok(OrchestratorConfig)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - File missing, parse failure, or validation failure
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var("ORCHESTRATOR_CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/orchestrator.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: OrchestratorConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/orchestrator.template.toml config/orchestrator.toml\n\
                Then edit config/orchestrator.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Loads configuration from the default path (equivalent to
    /// `load_from_path(None)`).
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - At least one domain is configured
    /// - All domains have unique ids
    /// - The fee policy parses as an unsigned integer
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Configuration is valid
    /// * `Err(anyhow::Error)` - Validation failed with error message
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: At least one [[domain]] must be configured"
            ));
        }

        for i in 0..self.domain.len() {
            for j in (i + 1)..self.domain.len() {
                if self.domain[i].domain == self.domain[j].domain {
                    return Err(anyhow::anyhow!(
                        "Configuration error: Domains '{}' and '{}' have the same domain id {}",
                        self.domain[i].name,
                        self.domain[j].name,
                        self.domain[i].domain
                    ));
                }
            }
        }

        self.default_max_fee()?;

        Ok(())
    }

    /// The configured default max fee as a [`U256`].
    pub fn default_max_fee(&self) -> anyhow::Result<U256> {
        U256::from_dec_str(&self.policy.default_max_fee).map_err(|_| {
            anyhow::anyhow!(
                "Configuration error: default_max_fee '{}' is not a valid decimal integer",
                self.policy.default_max_fee
            )
        })
    }

    /// Look up a domain config by its protocol-level id.
    pub fn get_domain(&self, domain: u32) -> Option<&DomainConfig> {
        self.domain.iter().find(|d| d.domain == domain)
    }
}
