//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, HomeserverConfig)
//! - [`provisioning`]: Provisioning secret and service-identity configuration
//! - [`bots`]: Service bot blocks (which identities serve which categories)

mod bots;
mod provisioning;
mod types;

pub use bots::BotBlock;
pub use provisioning::{ProvisioningConfig, DEFAULT_RESERVED_PREFIX};
pub use types::{Config, ConfigError, ConnectionTypesConfig, HomeserverConfig, ServerConfig};
