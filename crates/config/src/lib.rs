//! Configuration loading, validation, and management for assetwright.
//!
//! Loads configuration from `~/.assetwright/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use assetwright_core::{Domain, MergePolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.assetwright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Oracle provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Oracle model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for extraction and classification
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per oracle response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Oracle call behaviour
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Training corpus and fine-tuning
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Per-domain engine settings
    #[serde(default)]
    pub domains: DomainsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("oracle", &self.oracle)
            .field("gateway", &self.gateway)
            .field("corpus", &self.corpus)
            .field("domains", &self.domains)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Caller-side timeout for a single oracle call; expiry counts as a
    /// connectivity failure.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

fn default_oracle_timeout() -> u64 {
    60
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_oracle_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the per-domain JSONL corpora.
    /// Defaults to `~/.assetwright/corpus`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Whether accepted interactions are recorded at all
    #[serde(default = "default_true")]
    pub record_interactions: bool,

    /// Base model submitted to the fine-tuning collaborator
    #[serde(default = "default_fine_tune_model")]
    pub fine_tune_model: String,

    /// Training epochs requested for fine-tuning jobs
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

fn default_true() -> bool {
    true
}
fn default_fine_tune_model() -> String {
    "gpt-4o-mini-2024-07-18".into()
}
fn default_epochs() -> u32 {
    3
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: None,
            record_interactions: true,
            fine_tune_model: default_fine_tune_model(),
            epochs: default_epochs(),
        }
    }
}

/// Per-domain settings, one table per domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsConfig {
    #[serde(rename = "payment-stream", default = "payment_stream_defaults")]
    pub payment_stream: DomainConfig,

    #[serde(rename = "token-vault", default = "token_vault_defaults")]
    pub token_vault: DomainConfig,

    #[serde(rename = "token-creation", default = "token_creation_defaults")]
    pub token_creation: DomainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub merge_policy: MergePolicy,
}

fn payment_stream_defaults() -> DomainConfig {
    DomainConfig {
        merge_policy: Domain::PaymentStream.default_policy(),
    }
}
fn token_vault_defaults() -> DomainConfig {
    DomainConfig {
        merge_policy: Domain::TokenVault.default_policy(),
    }
}
fn token_creation_defaults() -> DomainConfig {
    DomainConfig {
        merge_policy: Domain::TokenCreation.default_policy(),
    }
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            payment_stream: payment_stream_defaults(),
            token_vault: token_vault_defaults(),
            token_creation: token_creation_defaults(),
        }
    }
}

impl DomainsConfig {
    /// The merge policy configured for a domain.
    pub fn policy_for(&self, domain: Domain) -> MergePolicy {
        match domain {
            Domain::PaymentStream => self.payment_stream.merge_policy,
            Domain::TokenVault => self.token_vault.merge_policy,
            Domain::TokenCreation => self.token_creation.merge_policy,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.assetwright/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ASSETWRIGHT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `ASSETWRIGHT_PROVIDER`, `ASSETWRIGHT_MODEL`
    /// - `ASSETWRIGHT_CORPUS_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("ASSETWRIGHT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("ASSETWRIGHT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("ASSETWRIGHT_MODEL") {
            config.default_model = model;
        }

        if let Ok(dir) = std::env::var("ASSETWRIGHT_CORPUS_DIR") {
            config.corpus.dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".assetwright")
    }

    /// Directory holding the training corpora.
    pub fn corpus_dir(&self) -> PathBuf {
        self.corpus
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("corpus"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "oracle.timeout_secs must be > 0".into(),
            ));
        }

        if self.corpus.epochs == 0 {
            return Err(ConfigError::ValidationError("corpus.epochs must be > 0".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            oracle: OracleConfig::default(),
            gateway: GatewayConfig::default(),
            corpus: CorpusConfig::default(),
            domains: DomainsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.corpus.epochs, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(
            parsed.domains.policy_for(Domain::PaymentStream),
            MergePolicy::DiffMerge
        );
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AppConfig {
            oracle: OracleConfig { timeout_secs: 0 },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn domain_policy_override_parsed() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
default_model = "gpt-4o"

[oracle]
timeout_secs = 15

[domains.token-vault]
merge_policy = "diff_merge"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.oracle.timeout(), Duration::from_secs(15));
        assert_eq!(config.domains.policy_for(Domain::TokenVault), MergePolicy::DiffMerge);
        // Untouched domains keep their defaults
        assert_eq!(
            config.domains.policy_for(Domain::TokenCreation),
            MergePolicy::FullReplace
        );
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "default_model = [").unwrap();
        let err = AppConfig::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn corpus_dir_override() {
        let config = AppConfig {
            corpus: CorpusConfig {
                dir: Some(PathBuf::from("/data/corpus")),
                ..CorpusConfig::default()
            },
            ..AppConfig::default()
        };
        assert_eq!(config.corpus_dir(), PathBuf::from("/data/corpus"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("payment-stream"));
    }
}
