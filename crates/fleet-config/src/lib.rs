use fleet_core::{FleetError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod credentials;
pub mod env_substitution;

pub use credentials::{process_env, GenieCredentials, HOST_ENV, SPACE_ID_ENV, TOKEN_ENV};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub genie: GenieSettings,
    #[serde(default)]
    pub fleet: FleetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Connection and polling settings for the Genie relay.
///
/// `host`, `token` and `space_id` are usually left out of the file and
/// supplied through the environment; see [`GenieSettings::resolved_with`].
#[derive(Clone, Serialize, Deserialize)]
pub struct GenieSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_env_file")]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSettings {
    #[serde(default = "default_fleet_size")]
    pub size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FleetError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut document: Value = serde_yaml::from_str(yaml)
            .map_err(|e| FleetError::ConfigError(format!("Failed to parse YAML: {}", e)))?;
        if document.is_null() {
            document = Value::Object(Default::default());
        }

        env_substitution::substitute_env_vars(&mut document)?;

        let config: AppConfig = serde_json::from_value(document)
            .map_err(|e| FleetError::ConfigError(format!("Invalid configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            Self::from_yaml(path)
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server.socket_addr()?;
        if self.genie.max_poll_attempts == 0 {
            return Err(FleetError::ConfigError("max_poll_attempts must be at least 1".into()));
        }
        if self.genie.request_timeout_secs == 0 {
            return Err(FleetError::ConfigError("request_timeout_secs must be at least 1".into()));
        }
        if self.fleet.size == 0 {
            return Err(FleetError::ConfigError("fleet size must be at least 1".into()));
        }
        Ok(())
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| FleetError::ConfigError(format!("Invalid bind address '{}': {}", self.bind, e)))
    }
}

impl GenieSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for GenieSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenieSettings")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("space_id", &self.space_id)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("env_file", &self.env_file)
            .finish()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for GenieSettings {
    fn default() -> Self {
        Self {
            host: None,
            token: None,
            space_id: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            accept_invalid_certs: false,
            env_file: default_env_file(),
        }
    }
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            size: default_fleet_size(),
            seed: None,
        }
    }
}

fn default_bind() -> String { "0.0.0.0:8000".to_string() }
fn default_poll_interval_secs() -> u64 { 3 }
fn default_max_poll_attempts() -> u32 { 20 }
fn default_request_timeout_secs() -> u64 { 60 }
fn default_env_file() -> Option<PathBuf> { Some(PathBuf::from(".env.local")) }
fn default_fleet_size() -> usize { 156 }
