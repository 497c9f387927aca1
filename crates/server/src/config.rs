//! Configuration management for the webdir server.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/webdir/config.toml`.
//! Values from the file are overridden first by `WEBDIR_*` environment
//! variables and then by command-line flags.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("root must name an existing directory, got {0}")]
    InvalidRoot(String),

    #[error("host must be an IP address literal, got {0}")]
    InvalidHost(String),

    #[error("basic_auth must be <user>:<password> with both parts non-empty")]
    InvalidBasicAuth,

    #[error("tls cert_path and key_path must be configured together")]
    PartialTlsKeyPair,

    #[error("max_body_size must be greater than 0, got {0}")]
    InvalidMaxBodySize(u64),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the webdir server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Serving configuration: root directory and bind address.
    pub server: ServerConfig,

    /// HTTP basic authentication.
    pub auth: AuthConfig,

    /// Operation toggles.
    pub access: AccessConfig,

    /// TLS settings.
    pub tls: TlsConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Serving configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory exposed over HTTP. All requests are confined beneath it.
    pub root: PathBuf,

    /// Bind host, an IP address literal.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Maximum accepted request body size in bytes (default: 1 GiB).
    pub max_body_size: u64,
}

/// HTTP basic authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Credentials as `user:password`. Unset disables authentication.
    pub basic_auth: Option<String>,
}

/// Server-wide operation toggles, all default-off.
///
/// A disabled operation is refused with 403 before any filesystem access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Allow directory listings.
    pub list: bool,

    /// Allow file downloads.
    pub read: bool,

    /// Allow folder creation.
    pub create: bool,

    /// Allow file uploads.
    pub write: bool,

    /// Allow deletions.
    pub delete: bool,

    /// Allow every operation, regardless of the individual toggles.
    pub all: bool,
}

/// TLS settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of HTTP.
    pub enabled: bool,

    /// PEM certificate path. Unset together with `key_path` generates a
    /// self-signed certificate at startup.
    pub cert_path: Option<PathBuf>,

    /// PEM private key path.
    pub key_path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log file path. Unset logs to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            host: "0.0.0.0".to_string(),
            port: 9999,
            max_body_size: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AccessConfig {
    /// Every operation enabled.
    pub fn allow_all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn allows_list(&self) -> bool {
        self.all || self.list
    }

    pub fn allows_read(&self) -> bool {
        self.all || self.read
    }

    pub fn allows_create(&self) -> bool {
        self.all || self.create
    }

    pub fn allows_write(&self) -> bool {
        self.all || self.write
    }

    pub fn allows_delete(&self) -> bool {
        self.all || self.delete
    }

    /// Names of the enabled operation classes, for startup logging.
    pub fn enabled_operations(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.allows_list() {
            enabled.push("list");
        }
        if self.allows_read() {
            enabled.push("read");
        }
        if self.allows_create() {
            enabled.push("create");
        }
        if self.allows_write() {
            enabled.push("write");
        }
        if self.allows_delete() {
            enabled.push("delete");
        }
        enabled
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("webdir")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - WEBDIR_HOST: Override the bind host
    /// - WEBDIR_PORT: Override the bind port
    /// - WEBDIR_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("WEBDIR_HOST") {
            if !host.is_empty() {
                tracing::info!("Overriding host from environment: {}", host);
                self.server.host = host;
            }
        }

        if let Ok(port) = std::env::var("WEBDIR_PORT") {
            if !port.is_empty() {
                match port.parse::<u16>() {
                    Ok(port) => {
                        tracing::info!("Overriding port from environment: {}", port);
                        self.server.port = port;
                    }
                    Err(_) => {
                        tracing::warn!("Ignoring invalid WEBDIR_PORT value: {}", port);
                    }
                }
            }
        }

        if let Ok(level) = std::env::var("WEBDIR_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.logging.log_level = level;
            }
        }
    }

    /// Validate the configuration values.
    ///
    /// Returns an error if any configuration value is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The served root must exist before the browser is built on it
        if !self.server.root.is_dir() {
            return Err(ConfigError::InvalidRoot(
                self.server.root.display().to_string(),
            ));
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidHost(self.server.host.clone()));
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::InvalidMaxBodySize(self.server.max_body_size));
        }

        // Both parts of user:password must be present and non-empty
        if let Some(raw) = &self.auth.basic_auth {
            let valid = raw
                .split_once(':')
                .is_some_and(|(user, pass)| !user.is_empty() && !pass.is_empty());
            if !valid {
                return Err(ConfigError::InvalidBasicAuth);
            }
        }

        if self.tls.cert_path.is_some() != self.tls.key_path.is_some() {
            return Err(ConfigError::PartialTlsKeyPair);
        }

        let level = self.logging.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.log_level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    ///
    /// The default path is `~/.config/webdir/config.toml`.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
