//! Server configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (HERMOD_*)
//! - TOML configuration file

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Path for the WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub websocket_path: String,

    /// Directory the frontend is served from.
    #[serde(default = "default_web_root")]
    pub web_root: String,
}

/// Resource limits configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per-session delivery queue capacity.
    #[serde(default = "default_delivery_queue_capacity")]
    pub delivery_queue_capacity: usize,

    /// Hub command inbox capacity.
    #[serde(default = "default_hub_inbox_capacity")]
    pub hub_inbox_capacity: usize,

    /// Maximum wire message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username to password table consulted at login.
    #[serde(default = "default_users")]
    pub users: HashMap<String, String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_host() -> String {
    std::env::var("HERMOD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("HERMOD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

fn default_true() -> bool {
    true
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_web_root() -> String {
    "./web".to_string()
}

fn default_delivery_queue_capacity() -> usize {
    256
}

fn default_hub_inbox_capacity() -> usize {
    1024
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_users() -> HashMap<String, String> {
    // Demo accounts, matching the bundled frontend.
    ["alice", "bob", "charlie", "dave"]
        .into_iter()
        .map(|name| (name.to_string(), "password123".to_string()))
        .collect()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            transport: TransportConfig::default(),
            limits: LimitsConfig::default(),
            auth: AuthConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            websocket_path: default_ws_path(),
            web_root: default_web_root(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            delivery_queue_capacity: default_delivery_queue_capacity(),
            hub_inbox_capacity: default_hub_inbox_capacity(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        // Try to load from default paths
        let config_paths = [
            "hermod.toml",
            "/etc/hermod/hermod.toml",
            "~/.config/hermod/hermod.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.transport.websocket_path, "/ws");
        assert_eq!(config.limits.delivery_queue_capacity, 256);
        assert!(config.auth.users.contains_key("alice"));
    }

    #[test]
    fn test_config_bind_addr() {
        let config = Config::default();
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000

            [limits]
            delivery_queue_capacity = 32

            [auth.users]
            eve = "hunter2"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.limits.delivery_queue_capacity, 32);
        assert_eq!(config.auth.users["eve"], "hunter2");
        assert!(!config.auth.users.contains_key("alice"));
    }
}
