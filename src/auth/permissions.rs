//! Room permission gate.
//!
//! Proves a caller's standing in a room before any connection operation
//! touches it. Service callers (shared-secret path) skip the gate; everyone
//! else must clear the provisioning power-level threshold in the room's
//! power-level state. A room without power-level state cannot prove
//! standing, so it always denies.

use crate::auth::identity::AuthContext;
use crate::client::{BotRegistry, ChatClient, ClientError};
use crate::error::{ProvisioningError, ProvisioningResult};
use roomlink_proto::RoomId;
use std::sync::Arc;
use tracing::warn;

/// Standing required for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    /// List/get operations.
    Read,
    /// Create/update/delete operations.
    Write,
}

/// Minimum room power level for provisioning access.
///
/// Read and write both gate at this single threshold.
pub const PROVISIONING_POWER_LEVEL: i64 = 90;

/// Authorizes callers against a room's power-level state.
pub struct PermissionGate {
    client: Arc<dyn ChatClient>,
    bots: Arc<dyn BotRegistry>,
}

impl PermissionGate {
    /// Create a gate over the given capabilities.
    pub fn new(client: Arc<dyn ChatClient>, bots: Arc<dyn BotRegistry>) -> Self {
        Self { client, bots }
    }

    /// Check that `auth` may perform an operation requiring `required`
    /// standing in `room`.
    ///
    /// A service identity must be joined to the room before standing is
    /// even consulted; its absence is [`ProvisioningError::NotInRoom`],
    /// distinct from an authorization denial.
    pub async fn authorize(
        &self,
        auth: &AuthContext,
        room: &RoomId,
        required: PermissionLevel,
    ) -> ProvisioningResult<()> {
        if auth.is_service {
            return Ok(());
        }

        if self.bots.bot_in_room(room, None).is_none() {
            return Err(ProvisioningError::NotInRoom);
        }

        let levels = match self.client.power_levels(room).await {
            Ok(levels) => levels,
            Err(ClientError::NotFound(_)) => {
                warn!(room = %room, caller = %auth.user_id, "Room has no power-level state; denying");
                return Err(ProvisioningError::Forbidden);
            }
            Err(err) => {
                return Err(ProvisioningError::Internal(anyhow::Error::new(err)));
            }
        };

        let level = levels.user_level(&auth.user_id);
        if level >= PROVISIONING_POWER_LEVEL {
            Ok(())
        } else {
            warn!(
                room = %room,
                caller = %auth.user_id,
                level,
                required = ?required,
                "Caller below provisioning power level"
            );
            Err(ProvisioningError::Forbidden)
        }
    }
}
