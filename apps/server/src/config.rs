//! YAML configuration: loaded once at startup, with a subset
//! re-appliable in place on SIGHUP.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Where `start` records its PID for `stop`/`reload` to find.
    /// Immutable after start, same as the bind address.
    #[serde(default = "default_pid_file")]
    pub pid_file: String,
}

fn default_pid_file() -> String {
    "capfox.pid".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AuthConfig {
    pub basic: Option<BasicAuthConfig>,
    pub debug_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub global_per_second: u32,
    pub per_ip_per_second: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    pub interval_ms: u64,
    #[serde(default)]
    pub storage_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThresholdsConfig {
    pub cpu_max_percent: f64,
    pub memory_max_percent: f64,
    pub gpu_max_percent: f64,
    pub vram_max_percent: f64,
    pub storage_min_free_gb: f64,
}

impl From<ThresholdsConfig> for capfox_domain_models::Thresholds {
    fn from(c: ThresholdsConfig) -> Self {
        capfox_domain_models::Thresholds {
            cpu_max_percent: c.cpu_max_percent,
            memory_max_percent: c.memory_max_percent,
            gpu_max_percent: c.gpu_max_percent,
            vram_max_percent: c.vram_max_percent,
            storage_min_free_gb: c.storage_min_free_gb,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Noop,
    MovingAverage,
    Linear,
    Polynomial,
    GradientBoost,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LearningConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    pub observation_delay_ms: u64,
    pub model: ModelKind,
}

fn default_max_workers() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrainConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Threshold,
    Predictive,
    Conservative,
    QueueAware,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionConfig {
    pub strategy: StrategyKind,
    #[serde(default)]
    pub safety_buffer: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersistenceConfig {
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapfoxConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub aggregator: AggregatorConfig,
    pub thresholds: ThresholdsConfig,
    pub learning: LearningConfig,
    pub retrain: RetrainConfig,
    pub decision: DecisionConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl CapfoxConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: CapfoxConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidField {
                field: "server.port".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if let Some(basic) = &self.auth.basic {
            if basic.username.is_empty() {
                return Err(ConfigError::InvalidField {
                    field: "auth.basic.username".to_string(),
                    reason: "must not be empty when auth.basic is configured".to_string(),
                });
            }
        }
        if self.rate_limit.global_per_second == 0 {
            return Err(ConfigError::InvalidField {
                field: "rate_limit.global_per_second".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if self.rate_limit.per_ip_per_second == 0 {
            return Err(ConfigError::InvalidField {
                field: "rate_limit.per_ip_per_second".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if self.aggregator.interval_ms == 0 {
            return Err(ConfigError::InvalidField {
                field: "aggregator.interval_ms".to_string(),
                reason: "must be nonzero".to_string(),
            });
        }
        if self.decision.safety_buffer < 0.0 {
            return Err(ConfigError::InvalidField {
                field: "decision.safety_buffer".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        if self.persistence.snapshot_path.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "persistence.snapshot_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.logging.format != "compact" && self.logging.format != "json" {
            return Err(ConfigError::InvalidField {
                field: "logging.format".to_string(),
                reason: format!("unknown format '{}', expected compact or json", self.logging.format),
            });
        }
        Ok(())
    }

    /// Base URL the CLI subcommands (`ask`, `notify`, `status`, `stats`,
    /// `run`) talk to. Always loopback-shaped even when `host` is a wildcard
    /// bind address, since the CLI runs on the same machine as the server.
    pub fn base_url(&self) -> String {
        let host = match self.server.host {
            std::net::IpAddr::V4(v4) if v4.is_unspecified() => "127.0.0.1".to_string(),
            std::net::IpAddr::V6(v6) if v6.is_unspecified() => "::1".to_string(),
            other => other.to_string(),
        };
        format!("http://{host}:{}", self.server.port)
    }

    /// Applies the SIGHUP-reloadable subset of a freshly-loaded config onto
    /// `self` in place: auth, thresholds, rate limits, logging level/format.
    /// The bind address is immutable after start and is left
    /// untouched even if the file on disk changed it.
    pub fn apply_reloadable(&mut self, fresh: CapfoxConfig) {
        self.auth = fresh.auth;
        self.thresholds = fresh.thresholds;
        self.rate_limit = fresh.rate_limit;
        self.logging = fresh.logging;
    }
}
