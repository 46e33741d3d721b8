//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::bots::BotBlock;
use super::provisioning::ProvisioningConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Homeserver the daemon acts against.
    pub homeserver: HomeserverConfig,
    /// Provisioning authentication configuration.
    pub provisioning: ProvisioningConfig,
    /// Which built-in connection types are enabled for provisioning.
    #[serde(default)]
    pub connection_types: ConnectionTypesConfig,
    /// Service bot blocks.
    #[serde(default)]
    pub bots: Vec<BotBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Public name of this deployment (e.g., "roomlink.straylight.net").
    pub name: String,
    /// Prometheus/health HTTP port (default: 9090).
    pub metrics_port: Option<u16>,
}

/// Homeserver connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeserverConfig {
    /// Base URL of the homeserver client API (e.g., "https://synapse.example.org").
    pub url: String,
    /// Access token for the daemon's own state reads.
    pub access_token: String,
    /// Request timeout in seconds for homeserver lookups (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Enable flags for the built-in connection types.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionTypesConfig {
    /// Generic inbound webhook connections.
    #[serde(default = "default_true")]
    pub webhook: bool,
    /// RSS/Atom feed subscriptions.
    #[serde(default = "default_true")]
    pub feed: bool,
    /// Chat command packs.
    #[serde(default = "default_true")]
    pub command: bool,
}

impl Default for ConnectionTypesConfig {
    fn default() -> Self {
        Self {
            webhook: true,
            feed: true,
            command: true,
        }
    }
}

pub(super) fn default_true() -> bool {
    true
}
