//! The connection directory.
//!
//! Tracks live connections per room, keyed by (room id, connection id).
//! This is the daemon's sole shared mutable state. Every mutation to a
//! room's connection set runs under that room's mutex, so cross-connection
//! invariants (command prefix uniqueness) hold even under concurrent
//! provisioning calls. Reads take the same lock briefly for a consistent
//! snapshot.

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::registry::{ConnectionType, ConnectionTypeRegistry};
use dashmap::DashMap;
use roomlink_proto::{RoomId, UserId};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Config key carrying a connection's chat command prefix.
const COMMAND_PREFIX_KEY: &str = "commandPrefix";

/// Placeholder substituted for secret config fields in detail payloads.
const REDACTED: &str = "<redacted>";

/// A live binding of a room to a configured integration instance.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Server-assigned id, unique within the owning room.
    pub id: String,
    /// Owning room.
    pub room_id: RoomId,
    /// Event-type key of the connection's type.
    pub event_type: String,
    /// Caller that provisioned the connection.
    pub created_by: UserId,
    /// Service identity acting for this connection.
    pub acting_bot: UserId,
    /// Creation time (unix seconds).
    pub created_at: i64,
    /// Type-specific configuration.
    pub config: Map<String, Value>,
}

impl Connection {
    /// The connection's command prefix, if it declares one.
    pub fn command_prefix(&self) -> Option<&str> {
        match self.config.get(COMMAND_PREFIX_KEY) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Shape this connection for a provisioning caller.
    ///
    /// Secret config fields are redacted unless `show_secrets` is set
    /// (create/update responses only).
    pub fn details(&self, ty: &ConnectionType, show_secrets: bool) -> ConnectionDetails {
        let mut config = self.config.clone();
        if !show_secrets {
            for field in &ty.secret_fields {
                if let Some(value) = config.get_mut(field) {
                    *value = Value::String(REDACTED.to_string());
                }
            }
        }
        ConnectionDetails {
            id: self.id.clone(),
            event_type: self.event_type.clone(),
            service: ty.service_category.clone(),
            created_at: self.created_at,
            config,
            warning: None,
        }
    }
}

/// Response payload for a single connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionDetails {
    /// Connection id.
    pub id: String,
    /// Event-type key.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Service category.
    pub service: String,
    /// Creation time (unix seconds).
    pub created_at: i64,
    /// Configuration, possibly with secret fields redacted.
    pub config: Map<String, Value>,
    /// Non-fatal degradation notice from creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Per-room connection store.
pub struct ConnectionDirectory {
    registry: Arc<ConnectionTypeRegistry>,
    reserved_prefixes: Vec<String>,
    rooms: DashMap<RoomId, Arc<Mutex<Vec<Connection>>>>,
}

impl ConnectionDirectory {
    /// Create an empty directory.
    pub fn new(registry: Arc<ConnectionTypeRegistry>, reserved_prefixes: Vec<String>) -> Self {
        Self {
            registry,
            reserved_prefixes,
            rooms: DashMap::new(),
        }
    }

    /// The mutation slot for `room`, created on first use.
    fn room_slot(&self, room: &RoomId) -> Arc<Mutex<Vec<Connection>>> {
        self.rooms.entry(room.clone()).or_default().clone()
    }

    /// List a room's connections, ordered by connection id.
    ///
    /// Connections whose type does not expose details are silently skipped,
    /// not erred.
    pub async fn list_for_room(&self, room: &RoomId) -> Vec<ConnectionDetails> {
        let slot = match self.rooms.get(room) {
            Some(slot) => slot.clone(),
            None => return Vec::new(),
        };
        let connections = slot.lock().await;
        let mut details: Vec<ConnectionDetails> = connections
            .iter()
            .filter_map(|conn| {
                let ty = self.registry.resolve_type(&conn.event_type)?;
                ty.capabilities.read_details.then(|| conn.details(ty, false))
            })
            .collect();
        details.sort_by(|a, b| a.id.cmp(&b.id));
        details
    }

    /// Fetch one connection's details.
    pub async fn get_by_id(
        &self,
        room: &RoomId,
        connection_id: &str,
    ) -> ProvisioningResult<ConnectionDetails> {
        let slot = self
            .rooms
            .get(room)
            .map(|slot| slot.clone())
            .ok_or_else(connection_not_found)?;
        let connections = slot.lock().await;
        let conn = connections
            .iter()
            .find(|c| c.id == connection_id)
            .ok_or_else(connection_not_found)?;
        let ty = self.descriptor_for(conn)?;
        if !ty.capabilities.read_details {
            return Err(ProvisioningError::UnsupportedOperation(
                "connection type does not support reading details".to_string(),
            ));
        }
        Ok(conn.details(ty, false))
    }

    /// Create a connection in `room`.
    ///
    /// Validates the config shape, the type's field rules, and the
    /// cross-connection command-prefix invariant, all while holding the
    /// room's lock so racing creates cannot both claim the same prefix.
    pub async fn create(
        &self,
        room: &RoomId,
        acting_bot: &UserId,
        caller: &UserId,
        ty: &ConnectionType,
        config: Value,
    ) -> ProvisioningResult<(Connection, Option<String>)> {
        let config = into_object(config)?;

        let slot = self.room_slot(room);
        let mut connections = slot.lock().await;

        if let Some(prefix) = object_command_prefix(&config)? {
            self.check_prefix_free(&connections, &prefix, None)?;
        }
        let warning = ty.validate_config(&config)?;

        let connection = Connection {
            id: format!("conn_{}", Uuid::new_v4().simple()),
            room_id: room.clone(),
            event_type: ty.event_type.clone(),
            created_by: caller.clone(),
            acting_bot: acting_bot.clone(),
            created_at: chrono::Utc::now().timestamp(),
            config,
        };
        connections.push(connection.clone());
        crate::metrics::connection_created();
        tracing::info!(
            room = %room,
            connection = %connection.id,
            event_type = %connection.event_type,
            caller = %caller,
            "Connection created"
        );
        Ok((connection, warning))
    }

    /// Apply a partial config update to an existing connection.
    ///
    /// The merged config is re-validated in full, including the prefix
    /// invariant (excluding the connection being updated).
    pub async fn update(
        &self,
        room: &RoomId,
        connection_id: &str,
        caller: &UserId,
        partial_config: Value,
    ) -> ProvisioningResult<Connection> {
        let partial = into_object(partial_config)?;

        let slot = self
            .rooms
            .get(room)
            .map(|slot| slot.clone())
            .ok_or_else(connection_not_found)?;
        let mut connections = slot.lock().await;

        let index = connections
            .iter()
            .position(|c| c.id == connection_id)
            .ok_or_else(connection_not_found)?;
        let ty = self.descriptor_for(&connections[index])?.clone();
        if !ty.capabilities.update || !ty.capabilities.read_details {
            return Err(ProvisioningError::UnsupportedOperation(
                "connection type does not support updates".to_string(),
            ));
        }

        let mut merged = connections[index].config.clone();
        for (key, value) in partial {
            merged.insert(key, value);
        }
        if let Some(prefix) = object_command_prefix(&merged)? {
            self.check_prefix_free(&connections, &prefix, Some(connection_id))?;
        }
        ty.validate_config(&merged)?;

        connections[index].config = merged;
        tracing::info!(
            room = %room,
            connection = %connection_id,
            caller = %caller,
            "Connection updated"
        );
        Ok(connections[index].clone())
    }

    /// Remove a connection. Permanent and immediate.
    pub async fn remove(&self, room: &RoomId, connection_id: &str) -> ProvisioningResult<()> {
        let slot = self
            .rooms
            .get(room)
            .map(|slot| slot.clone())
            .ok_or_else(connection_not_found)?;
        let mut connections = slot.lock().await;

        let index = connections
            .iter()
            .position(|c| c.id == connection_id)
            .ok_or_else(connection_not_found)?;
        let ty = self.descriptor_for(&connections[index])?;
        if !ty.capabilities.remove {
            return Err(ProvisioningError::UnsupportedOperation(
                "connection does not support removal".to_string(),
            ));
        }

        connections.remove(index);
        crate::metrics::connection_removed();
        tracing::info!(room = %room, connection = %connection_id, "Connection removed");
        Ok(())
    }

    fn descriptor_for(&self, conn: &Connection) -> ProvisioningResult<&ConnectionType> {
        self.registry.resolve_type(&conn.event_type).ok_or_else(|| {
            ProvisioningError::Internal(anyhow::anyhow!(
                "connection {} has unregistered type {}",
                conn.id,
                conn.event_type
            ))
        })
    }

    /// Enforce the cross-connection prefix invariant within one room.
    fn check_prefix_free(
        &self,
        connections: &[Connection],
        candidate: &str,
        exclude_id: Option<&str>,
    ) -> ProvisioningResult<()> {
        if self
            .reserved_prefixes
            .iter()
            .any(|p| p.eq_ignore_ascii_case(candidate))
        {
            return Err(ProvisioningError::ConflictingConnection(format!(
                "command prefix {candidate:?} is reserved"
            )));
        }
        let collision = connections
            .iter()
            .filter(|c| exclude_id != Some(c.id.as_str()))
            .filter_map(|c| c.command_prefix())
            .any(|p| p.eq_ignore_ascii_case(candidate));
        if collision {
            return Err(ProvisioningError::ConflictingConnection(format!(
                "command prefix {candidate:?} is already in use in this room"
            )));
        }
        Ok(())
    }
}

fn connection_not_found() -> ProvisioningError {
    ProvisioningError::NotFound("connection does not exist".to_string())
}

/// Require a JSON object body.
fn into_object(value: Value) -> ProvisioningResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProvisioningError::BadValue(
            "a JSON object body must be provided".to_string(),
        )),
    }
}

/// Extract and validate a config object's command prefix.
fn object_command_prefix(config: &Map<String, Value>) -> ProvisioningResult<Option<String>> {
    match config.get(COMMAND_PREFIX_KEY) {
        None => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ProvisioningError::BadValue(
                    "commandPrefix must be a non-empty string".to_string(),
                ))
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(_) => Err(ProvisioningError::BadValue(
            "commandPrefix must be a non-empty string".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionTypesConfig;
    use crate::registry::Capabilities;
    use serde_json::json;

    fn room(s: &str) -> RoomId {
        s.parse().expect("valid room id")
    }

    fn user(s: &str) -> UserId {
        s.parse().expect("valid user id")
    }

    fn registry() -> Arc<ConnectionTypeRegistry> {
        Arc::new(ConnectionTypeRegistry::from_config(
            &ConnectionTypesConfig::default(),
        ))
    }

    fn directory() -> ConnectionDirectory {
        ConnectionDirectory::new(registry(), vec!["!roomlink".to_string()])
    }

    fn command_type(dir: &ConnectionDirectory) -> ConnectionType {
        dir.registry
            .resolve_type("org.roomlink.command")
            .expect("command type registered")
            .clone()
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let dir = directory();
        let ty = command_type(&dir);
        let (first, _) = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!a"}),
            )
            .await
            .expect("first create");
        let (second, _) = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!b"}),
            )
            .await
            .expect("second create");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn create_rejects_non_object_body() {
        let dir = directory();
        let ty = command_type(&dir);
        let err = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!("not an object"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "bad_value");
    }

    #[tokio::test]
    async fn prefix_collision_within_room_is_rejected() {
        let dir = directory();
        let ty = command_type(&dir);
        dir.create(
            &room("!r:test"),
            &user("@bot:test"),
            &user("@alice:test"),
            &ty,
            json!({"commandPrefix": "!deploy"}),
        )
        .await
        .expect("first create");

        let err = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@bob:test"),
                &ty,
                json!({"commandPrefix": "!DEPLOY"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "conflicting_connection");
        assert!(err.to_string().contains("!DEPLOY"));
    }

    #[tokio::test]
    async fn same_prefix_in_other_room_is_fine() {
        let dir = directory();
        let ty = command_type(&dir);
        for r in ["!one:test", "!two:test"] {
            dir.create(
                &room(r),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!deploy"}),
            )
            .await
            .expect("create succeeds in each room");
        }
    }

    #[tokio::test]
    async fn reserved_prefix_is_rejected() {
        let dir = directory();
        let ty = command_type(&dir);
        let err = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!roomlink"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "conflicting_connection");
        assert!(err.to_string().contains("reserved"));
    }

    #[tokio::test]
    async fn update_keeps_own_prefix_without_conflict() {
        let dir = directory();
        let ty = command_type(&dir);
        let (conn, _) = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!deploy"}),
            )
            .await
            .expect("create");

        // Updating an unrelated field must not trip over the connection's
        // own existing prefix.
        let updated = dir
            .update(
                &room("!r:test"),
                &conn.id,
                &user("@alice:test"),
                json!({"note": "still mine"}),
            )
            .await
            .expect("update succeeds");
        assert_eq!(updated.command_prefix(), Some("!deploy"));
        assert_eq!(updated.config.get("note"), Some(&json!("still mine")));
    }

    #[tokio::test]
    async fn update_unknown_connection_is_not_found() {
        let dir = directory();
        let err = dir
            .update(
                &room("!r:test"),
                "conn_missing",
                &user("@alice:test"),
                json!({}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn remove_twice_fails_the_second_time() {
        let dir = directory();
        let ty = command_type(&dir);
        let (conn, _) = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"commandPrefix": "!x"}),
            )
            .await
            .expect("create");

        dir.remove(&room("!r:test"), &conn.id)
            .await
            .expect("first remove succeeds");
        let err = dir.remove(&room("!r:test"), &conn.id).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn secrets_are_redacted_unless_requested() {
        let dir = directory();
        let ty = dir
            .registry
            .resolve_type("org.roomlink.webhook")
            .expect("webhook type")
            .clone();
        let (conn, _) = dir
            .create(
                &room("!r:test"),
                &user("@bot:test"),
                &user("@alice:test"),
                &ty,
                json!({"name": "builds", "token": "s3cret"}),
            )
            .await
            .expect("create");

        let public = conn.details(&ty, false);
        assert_eq!(public.config.get("token"), Some(&json!("<redacted>")));

        let private = conn.details(&ty, true);
        assert_eq!(private.config.get("token"), Some(&json!("s3cret")));
    }

    #[tokio::test]
    async fn list_skips_types_without_read_details() {
        let mut reg = ConnectionTypeRegistry::from_config(&ConnectionTypesConfig::default());
        reg.insert(ConnectionType {
            event_type: "org.roomlink.opaque".to_string(),
            service_category: "opaque".to_string(),
            capabilities: Capabilities {
                read_details: false,
                update: false,
                remove: true,
            },
            required_fields: Vec::new(),
            secret_fields: Vec::new(),
            url_field: None,
        });
        let reg = Arc::new(reg);
        let dir = ConnectionDirectory::new(reg.clone(), Vec::new());

        let opaque = reg.resolve_type("org.roomlink.opaque").expect("opaque").clone();
        let webhook = reg.resolve_type("org.roomlink.webhook").expect("webhook").clone();

        dir.create(
            &room("!r:test"),
            &user("@bot:test"),
            &user("@alice:test"),
            &opaque,
            json!({}),
        )
        .await
        .expect("opaque create");
        dir.create(
            &room("!r:test"),
            &user("@bot:test"),
            &user("@alice:test"),
            &webhook,
            json!({"name": "builds"}),
        )
        .await
        .expect("webhook create");

        let listed = dir.list_for_room(&room("!r:test")).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].event_type, "org.roomlink.webhook");
    }
}
