//! roomlinkd - Room-to-service integration provisioning daemon.
//!
//! roomlinkd mediates every read and write of a "connection" - the binding
//! of a chat room to an external-service integration instance - through a
//! two-tier authentication scheme (shared provisioning secret or bearer
//! token) and a per-room power-level permission check.
//!
//! The crate exposes the provisioning core as a library; the daemon binary
//! wires it to a homeserver and serves the operational HTTP endpoints.

pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod metrics;
pub mod provisioner;
pub mod registry;

pub use error::{ProvisioningError, ProvisioningResult};
pub use provisioner::Provisioner;
