//! Daemon configuration with TOML file support.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vouch_rpc::ApiConfig;
use vouch_types::PolicyParams;
use vouch_utils::LogFormat;
use vouch_verification::WorldClientConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where rate-limit windows are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterBackend {
    /// Process-local; windows reset on restart.
    #[default]
    Memory,
    /// Persisted in the LMDB environment.
    Store,
}

impl std::str::FromStr for LimiterBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "store" | "lmdb" => Ok(Self::Store),
            other => Err(ConfigError::Invalid(format!(
                "unknown rate limit backend: {other}"
            ))),
        }
    }
}

/// Configuration for a Vouch daemon.
///
/// Loaded from a TOML file via [`AppConfig::from_toml_file`]; every field has
/// a default, so an empty file is a valid development configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Production mode: cookies are marked `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,

    /// HMAC key for session cookies.
    #[serde(default)]
    pub session_secret: Option<String>,

    #[serde(default = "default_true")]
    pub places_require_auth: bool,

    #[serde(default)]
    pub rate_limit_backend: LimiterBackend,

    #[serde(default = "default_votes_per_day")]
    pub votes_per_day: u32,

    #[serde(default = "default_proximity_radius")]
    pub proximity_radius_m: u64,

    #[serde(default)]
    pub world_app_id: Option<String>,

    #[serde(default)]
    pub world_api_key: Option<String>,

    #[serde(default = "default_world_api_base")]
    pub world_api_base: String,

    /// Whole-request timeout for the verifier and payment oracle.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// How often expired rate-limit windows are dropped.
    #[serde(default = "default_purge_interval")]
    pub limiter_purge_interval_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./vouch_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_votes_per_day() -> u32 {
    PolicyParams::default().votes_per_window
}

fn default_proximity_radius() -> u64 {
    PolicyParams::default().proximity_radius_m
}

fn default_world_api_base() -> String {
    vouch_verification::world::DEFAULT_BASE_URL.to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_purge_interval() -> u64 {
    10 * 60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.votes_per_day == 0 {
            return Err(ConfigError::Invalid("votes_per_day must be positive".into()));
        }
        if self.proximity_radius_m == 0 {
            return Err(ConfigError::Invalid(
                "proximity_radius_m must be positive".into(),
            ));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream_timeout_secs must be positive".into(),
            ));
        }
        if self.limiter_purge_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "limiter_purge_interval_secs must be positive".into(),
            ));
        }
        if self.session_secret.as_deref() == Some("") {
            return Err(ConfigError::Invalid("session_secret must not be empty".into()));
        }
        Ok(())
    }

    pub fn policy(&self) -> PolicyParams {
        PolicyParams {
            proximity_radius_m: self.proximity_radius_m,
            votes_per_window: self.votes_per_day,
            ..PolicyParams::default()
        }
    }

    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            secure_cookies: self.secure_cookies,
            places_require_auth: self.places_require_auth,
            enable_metrics: self.enable_metrics,
            session_secret: self.session_secret.clone(),
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
            params: self.policy(),
        }
    }

    pub fn world_client(&self) -> WorldClientConfig {
        WorldClientConfig {
            app_id: self.world_app_id.clone(),
            api_key: self.world_api_key.clone(),
            base_url: self.world_api_base.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_secs),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            lmdb_map_size: default_map_size(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            secure_cookies: false,
            session_secret: None,
            places_require_auth: true,
            rate_limit_backend: LimiterBackend::default(),
            votes_per_day: default_votes_per_day(),
            proximity_radius_m: default_proximity_radius(),
            world_app_id: None,
            world_api_key: None,
            world_api_base: default_world_api_base(),
            upstream_timeout_secs: default_upstream_timeout(),
            enable_metrics: true,
            limiter_purge_interval_secs: default_purge_interval(),
        }
    }
}
