//! Caller identity resolution.
//!
//! Two credential forms are accepted:
//!
//! - the pre-shared provisioning secret, matched by exact equality, which
//!   resolves to the configured service identity and bypasses all room
//!   checks downstream;
//! - a `Bearer <token>` header, resolved to a caller identity by asking the
//!   homeserver who the token belongs to.
//!
//! Malformed headers fail before any network call is attempted.

use crate::client::{ChatClient, ClientError};
use crate::config::ProvisioningConfig;
use crate::error::{ProvisioningError, ProvisioningResult};
use roomlink_proto::UserId;
use std::sync::Arc;
use tracing::debug;

/// Request-scoped caller context. Reconstructed for every request, never
/// persisted.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Resolved caller identity.
    pub user_id: UserId,
    /// Whether the caller authenticated with the shared provisioning secret.
    /// Service callers have universal standing and skip the room gate.
    pub is_service: bool,
}

/// Turns a request credential into an [`AuthContext`].
pub struct IdentityResolver {
    secret: String,
    service_user_id: UserId,
    client: Arc<dyn ChatClient>,
}

impl IdentityResolver {
    /// Create a resolver from provisioning config and a homeserver client.
    pub fn new(config: &ProvisioningConfig, client: Arc<dyn ChatClient>) -> Self {
        Self {
            secret: config.secret.clone(),
            service_user_id: config.service_user_id.clone(),
            client,
        }
    }

    /// Resolve the `Authorization` header value into a caller context.
    pub async fn resolve(&self, authorization: Option<&str>) -> ProvisioningResult<AuthContext> {
        if let Some(header) = authorization {
            if header == format!("Bearer {}", self.secret) {
                debug!(service_user = %self.service_user_id, "Caller authenticated via provisioning secret");
                return Ok(AuthContext {
                    user_id: self.service_user_id.clone(),
                    is_service: true,
                });
            }
        }

        let token = extract_token(authorization)?;
        let raw_identity = self.client.whoami(token).await.map_err(|err| {
            debug!(error = %err, "Token identity lookup failed");
            match err {
                ClientError::Unauthorized => {
                    ProvisioningError::BadToken("token was rejected".to_string())
                }
                ClientError::NotFound(_) | ClientError::Lookup(_) => {
                    ProvisioningError::BadToken("could not resolve token identity".to_string())
                }
            }
        })?;

        // The homeserver answered; its answer still has to look like a user id.
        let user_id: UserId = raw_identity
            .parse()
            .map_err(|_| ProvisioningError::BadValue("invalid userId".to_string()))?;

        Ok(AuthContext {
            user_id,
            is_service: false,
        })
    }
}

/// Pull the token out of a `Bearer <token>` header.
fn extract_token(header: Option<&str>) -> ProvisioningResult<&str> {
    let header =
        header.ok_or_else(|| ProvisioningError::BadToken("no authorization header".to_string()))?;
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return Err(ProvisioningError::BadToken(
            "invalid authorization header".to_string(),
        ));
    }
    Ok(parts[1])
}
