//! The provisioning dispatcher.
//!
//! Orchestrates every provisioning operation as a linear pipeline of
//! fallible steps, short-circuiting on the first failure:
//!
//! 1. resolve the caller's identity from the request credential;
//! 2. validate the room id's surface syntax (room-scoped operations);
//! 3. prove the caller's room standing through the permission gate;
//! 4. resolve the connection type (create) or the connection (get/update/
//!    delete);
//! 5. run the directory operation and shape the response.
//!
//! Each request is all-or-nothing against the directory: there are no
//! retries and no partial commits, and a failure in one request never
//! affects another.

use crate::auth::{AuthContext, IdentityResolver, PermissionGate, PermissionLevel};
use crate::client::{BotRegistry, ChatClient};
use crate::config::ProvisioningConfig;
use crate::directory::{Connection, ConnectionDetails, ConnectionDirectory};
use crate::error::{ProvisioningError, ProvisioningResult};
use crate::metrics;
use crate::registry::{ConnectionTypeDetails, ConnectionTypeRegistry};
use roomlink_proto::RoomId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Health check payload. Deliberately empty: reachability is the signal.
#[derive(Debug, Clone, Serialize)]
pub struct Health {}

/// The provisioning core.
///
/// Holds its collaborators behind capability seams; all configuration is
/// passed in at construction and immutable afterwards.
pub struct Provisioner {
    resolver: IdentityResolver,
    gate: PermissionGate,
    registry: Arc<ConnectionTypeRegistry>,
    directory: Arc<ConnectionDirectory>,
    bots: Arc<dyn BotRegistry>,
}

impl Provisioner {
    /// Wire up a provisioner from config and capabilities.
    pub fn new(
        config: &ProvisioningConfig,
        client: Arc<dyn ChatClient>,
        bots: Arc<dyn BotRegistry>,
        registry: Arc<ConnectionTypeRegistry>,
        directory: Arc<ConnectionDirectory>,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(config, client.clone()),
            gate: PermissionGate::new(client, bots.clone()),
            registry,
            directory,
            bots,
        }
    }

    /// Liveness probe. No authentication, no side effects.
    pub fn health(&self) -> Health {
        Health {}
    }

    /// List the connection types enabled for provisioning.
    ///
    /// Requires a valid credential but no room standing.
    pub async fn connection_types(
        &self,
        authorization: Option<&str>,
    ) -> ProvisioningResult<BTreeMap<String, ConnectionTypeDetails>> {
        self.run("connection_types", async {
            self.resolver.resolve(authorization).await?;
            Ok(self.registry.enabled())
        })
        .await
    }

    /// List a room's connections.
    pub async fn list_connections(
        &self,
        authorization: Option<&str>,
        room_id: &str,
    ) -> ProvisioningResult<Vec<ConnectionDetails>> {
        self.run("list_connections", async {
            let (_, room) = self
                .authorize_room(authorization, room_id, PermissionLevel::Read)
                .await?;
            Ok(self.directory.list_for_room(&room).await)
        })
        .await
    }

    /// Fetch one connection.
    pub async fn get_connection(
        &self,
        authorization: Option<&str>,
        room_id: &str,
        connection_id: &str,
    ) -> ProvisioningResult<ConnectionDetails> {
        self.run("get_connection", async {
            let (_, room) = self
                .authorize_room(authorization, room_id, PermissionLevel::Read)
                .await?;
            self.directory.get_by_id(&room, connection_id).await
        })
        .await
    }

    /// Create a connection of the named type in a room.
    ///
    /// Type resolution precedes body validation: an unknown event type is
    /// `NotFound` even when the body is garbage. After the type resolves,
    /// an eligible service identity for its category must be joined to the
    /// room before the directory is touched.
    pub async fn create_connection(
        &self,
        authorization: Option<&str>,
        room_id: &str,
        event_type: &str,
        config: Value,
    ) -> ProvisioningResult<ConnectionDetails> {
        self.run("create_connection", async {
            let (auth, room) = self
                .authorize_room(authorization, room_id, PermissionLevel::Write)
                .await?;
            let ty = self
                .registry
                .resolve_type(event_type)
                .ok_or_else(|| ProvisioningError::NotFound("unknown event type".to_string()))?;

            let acting_bot = self
                .bots
                .bot_in_room(&room, Some(&ty.service_category))
                .ok_or(ProvisioningError::NotInRoom)?;

            let (connection, warning) = self
                .directory
                .create(&room, &acting_bot, &auth.user_id, ty, config)
                .await
                .map_err(|err| {
                    error!(room = %room, caller = %auth.user_id, error = %err, "Failed to create connection");
                    err
                })?;

            let mut details = connection.details(ty, true);
            details.warning = warning;
            Ok(details)
        })
        .await
    }

    /// Apply a partial config update to a connection.
    pub async fn update_connection(
        &self,
        authorization: Option<&str>,
        room_id: &str,
        connection_id: &str,
        partial_config: Value,
    ) -> ProvisioningResult<ConnectionDetails> {
        self.run("update_connection", async {
            let (auth, room) = self
                .authorize_room(authorization, room_id, PermissionLevel::Write)
                .await?;
            let connection = self
                .directory
                .update(&room, connection_id, &auth.user_id, partial_config)
                .await?;
            self.details_for(&connection, true)
        })
        .await
    }

    /// Remove a connection. Permanent.
    pub async fn delete_connection(
        &self,
        authorization: Option<&str>,
        room_id: &str,
        connection_id: &str,
    ) -> ProvisioningResult<()> {
        self.run("delete_connection", async {
            let (_, room) = self
                .authorize_room(authorization, room_id, PermissionLevel::Write)
                .await?;
            self.directory.remove(&room, connection_id).await
        })
        .await
    }

    /// Shared front half of every room-scoped pipeline: identity, room-id
    /// surface validation, permission gate, in that order.
    async fn authorize_room(
        &self,
        authorization: Option<&str>,
        room_id: &str,
        required: PermissionLevel,
    ) -> ProvisioningResult<(AuthContext, RoomId)> {
        let auth = self.resolver.resolve(authorization).await?;
        let room: RoomId = room_id
            .parse()
            .map_err(|_| ProvisioningError::BadValue("invalid roomId".to_string()))?;
        self.gate.authorize(&auth, &room, required).await?;
        Ok((auth, room))
    }

    fn details_for(
        &self,
        connection: &Connection,
        show_secrets: bool,
    ) -> ProvisioningResult<ConnectionDetails> {
        let ty = self
            .registry
            .resolve_type(&connection.event_type)
            .ok_or_else(|| {
                ProvisioningError::Internal(anyhow::anyhow!(
                    "connection {} has unregistered type {}",
                    connection.id,
                    connection.event_type
                ))
            })?;
        Ok(connection.details(ty, show_secrets))
    }

    /// Run one operation with request/latency/error metrics.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> ProvisioningResult<T>
    where
        F: Future<Output = ProvisioningResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        metrics::record_operation(operation, start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics::record_operation_error(operation, err.code());
        }
        result
    }
}
