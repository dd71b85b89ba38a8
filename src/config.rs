use crate::media::media_buffer::MimeType;
use crate::media::validator::ValidationPolicy;
use crate::transfer::backoff::Backoff;
use crate::transfer::request::ModelSelector;
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PREFIX: &str = "SNAP_PREDICT_";

/// What a submission does while another one is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupersedePolicy {
    /// Cancel the pending request and start the new one.
    #[default]
    LatestWins,
    /// Refuse the new submission with `Busy`.
    RejectWhileBusy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub backoff_jitter: bool,
    pub request_timeout: Duration,
}

impl TransferConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_base, self.backoff_max, self.backoff_jitter)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(8),
            backoff_jitter: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub validation: ValidationPolicy,
    pub transfer: TransferConfig,
    pub supersede_policy: SupersedePolicy,
    pub default_model: ModelSelector,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/predict".to_string(),
            validation: ValidationPolicy::default(),
            transfer: TransferConfig::default(),
            supersede_policy: SupersedePolicy::default(),
            default_model: ModelSelector::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] serde_env::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Environment overlay; every field is optional and falls back to `Default`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    endpoint: Option<String>,
    max_size_bytes: Option<usize>,
    allowed_types: Option<String>,
    max_attempts: Option<u32>,
    backoff_base_ms: Option<u64>,
    backoff_max_ms: Option<u64>,
    backoff_jitter: Option<bool>,
    request_timeout_ms: Option<u64>,
    supersede_policy: Option<SupersedePolicy>,
    default_model: Option<ModelSelector>,
}

impl Config {
    /// Reads `SNAP_PREDICT_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_string(), value.as_ref().to_string()))
            })
            .collect();

        let raw: RawConfig = serde_env::from_iter(scoped)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(endpoint) = raw.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(max_size_bytes) = raw.max_size_bytes {
            config.validation.max_size_bytes = max_size_bytes;
        }
        if let Some(allowed_types) = raw.allowed_types {
            config.validation.allowed_mime_types = parse_allowed_types(&allowed_types)?;
        }
        if let Some(max_attempts) = raw.max_attempts {
            config.transfer.max_attempts = max_attempts;
        }
        if let Some(ms) = raw.backoff_base_ms {
            config.transfer.backoff_base = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.backoff_max_ms {
            config.transfer.backoff_max = Duration::from_millis(ms);
        }
        if let Some(jitter) = raw.backoff_jitter {
            config.transfer.backoff_jitter = jitter;
        }
        if let Some(ms) = raw.request_timeout_ms {
            config.transfer.request_timeout = Duration::from_millis(ms);
        }
        if let Some(policy) = raw.supersede_policy {
            config.supersede_policy = policy;
        }
        if let Some(model) = raw.default_model {
            config.default_model = model;
        }

        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.transfer.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.transfer.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be positive".into()));
        }
        if self.validation.allowed_mime_types.is_empty() {
            return Err(ConfigError::Invalid("allowed_types must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_allowed_types(raw: &str) -> Result<std::collections::HashSet<MimeType>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match MimeType::parse(entry) {
            MimeType::Unrecognized(other) => Err(ConfigError::Invalid(format!(
                "unsupported entry in allowed_types: {}",
                other
            ))),
            mime_type => Ok(mime_type),
        })
        .collect()
}
