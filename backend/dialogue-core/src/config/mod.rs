use crate::error::config::ConfigError;
use crate::{DIALOGUE_SERVER_HOST, DIALOGUE_SERVER_PORT};

use common::ErrorLocation;

use std::net::IpAddr;
use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

/// Upper bound for the per-read buffer. One read is one message, so this is
/// also the largest request the server can receive.
pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024;

// ============================================
// CONFIG STRUCT
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Loopback address the listener binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener port. `0` picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bytes requested per socket read.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Per-read timeout. An elapsed read is retried, never treated as an error.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    #[serde(default = "default_listen_backlog")]
    pub listen_backlog: u32,

    /// Total time allowed for fetching the secret from the auth peer.
    #[serde(default = "default_auth_channel_timeout_ms")]
    pub auth_channel_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: default_host(),
            port: default_port(),
            read_buffer_size: default_read_buffer_size(),
            read_timeout_ms: None,
            listen_backlog: default_listen_backlog(),
            auth_channel_timeout_ms: default_auth_channel_timeout_ms(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host() -> String {
    DIALOGUE_SERVER_HOST.to_string()
}
fn default_port() -> u16 {
    DIALOGUE_SERVER_PORT
}
fn default_read_buffer_size() -> usize {
    1024
}
fn default_listen_backlog() -> u32 {
    5
}
fn default_auth_channel_timeout_ms() -> u64 {
    5_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ServerConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ServerConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        // Every field has a default, so serde would also accept an array
        if !value.is_object() {
            warn!("Config file is not a JSON object");
            return Err(ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path,
                reason: String::from("expected a JSON object at the top level"),
            });
        }

        let config: ServerConfig = serde_json::from_value(value).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// Uses temp file + rename so a crash never leaves a half-written file.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        // The server is local-only: never bind a routable interface
        let host: IpAddr = self.host.parse().map_err(|_| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid host address: {}", self.host),
        })?;
        if !host.is_loopback() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Host must be a loopback address: {}", self.host),
            });
        }

        if self.read_buffer_size == 0 || self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid read buffer size: {} (must be 1-{})",
                    self.read_buffer_size, MAX_READ_BUFFER_SIZE
                ),
            });
        }

        if self.read_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "read_timeout_ms cannot be 0 (omit it to disable the timeout)"
                    .to_string(),
            });
        }

        if self.listen_backlog == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "listen_backlog must be at least 1".to_string(),
            });
        }

        if self.auth_channel_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "auth_channel_timeout_ms must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// `host:port` string for the listener.
    pub fn bind_address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]:{}", self.host, self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn auth_channel_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_channel_timeout_ms)
    }
}
