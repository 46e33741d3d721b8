//! Provisioning authentication configuration.

use roomlink_proto::UserId;
use serde::Deserialize;

/// Command prefix reserved for the daemon's own chat commands. Connections
/// may not claim it.
pub const DEFAULT_RESERVED_PREFIX: &str = "!roomlink";

/// Provisioning secret and service-identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    /// Shared secret for privileged provisioning callers.
    pub secret: String,
    /// Identity that shared-secret callers act as.
    pub service_user_id: UserId,
    /// Command prefixes no connection may claim.
    #[serde(default = "default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,
}

fn default_reserved_prefixes() -> Vec<String> {
    vec![DEFAULT_RESERVED_PREFIX.to_string()]
}

/// Minimum acceptable secret length.
const MIN_SECRET_LEN: usize = 16;

/// Placeholder secrets that ship in example configs and must never reach
/// production.
const PLACEHOLDER_SECRETS: &[&str] = &["changeme", "secret", "provisioning-secret", "hunter2"];

impl ProvisioningConfig {
    /// Check whether the configured secret is empty, a known placeholder, or
    /// too short to resist guessing. The daemon refuses to start on `true`.
    pub fn is_insecure_secret(&self) -> bool {
        let secret = self.secret.trim();
        secret.len() < MIN_SECRET_LEN
            || PLACEHOLDER_SECRETS
                .iter()
                .any(|p| secret.eq_ignore_ascii_case(p))
    }
}
