//! Connection type registry.
//!
//! Maps an event-type name to a [`ConnectionType`] descriptor. The registry
//! is built once at startup from config and never mutated afterwards, so
//! lookups are plain map reads. Capabilities are declared data on the
//! descriptor, checked at resolution time, never probed at runtime.

use crate::error::{ProvisioningError, ProvisioningResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::config::ConnectionTypesConfig;

/// Which operations a connection type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The connection can be rendered for provisioning callers.
    pub read_details: bool,
    /// The connection's configuration can be updated in place.
    pub update: bool,
    /// The connection can be removed.
    pub remove: bool,
}

impl Capabilities {
    /// Full capability set.
    pub const fn all() -> Self {
        Self {
            read_details: true,
            update: true,
            remove: true,
        }
    }
}

/// Descriptor for one integration kind.
#[derive(Debug, Clone)]
pub struct ConnectionType {
    /// The event-type key naming this kind (e.g. `org.roomlink.feed`).
    pub event_type: String,
    /// Service category used to pick an eligible acting bot.
    pub service_category: String,
    /// Supported operations.
    pub capabilities: Capabilities,
    /// Config fields that must be present as non-empty strings.
    pub required_fields: Vec<String>,
    /// Config fields redacted from detail payloads unless secrets were
    /// explicitly requested (create/update responses).
    pub secret_fields: Vec<String>,
    /// Config field holding a URL; plain-http values degrade the connection
    /// and produce a creation warning.
    pub url_field: Option<String>,
}

impl ConnectionType {
    /// Validate a connection config object against this type's rules.
    ///
    /// Returns an optional non-fatal warning on success.
    pub fn validate_config(&self, config: &Map<String, Value>) -> ProvisioningResult<Option<String>> {
        for field in &self.required_fields {
            match config.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(_) => {
                    return Err(ProvisioningError::BadValue(format!(
                        "field {field:?} must be a non-empty string"
                    )));
                }
                None => {
                    return Err(ProvisioningError::BadValue(format!(
                        "missing required field {field:?}"
                    )));
                }
            }
        }

        if let Some(url_field) = &self.url_field {
            if let Some(Value::String(url)) = config.get(url_field) {
                if url.starts_with("http://") {
                    return Ok(Some(format!(
                        "{url_field} does not use https; delivery will be unencrypted"
                    )));
                }
            }
        }

        Ok(None)
    }

    /// Serializable description of this type for the type listing.
    pub fn details(&self) -> ConnectionTypeDetails {
        let mut supports = Vec::new();
        if self.capabilities.read_details {
            supports.push("read");
        }
        if self.capabilities.update {
            supports.push("update");
        }
        if self.capabilities.remove {
            supports.push("remove");
        }
        ConnectionTypeDetails {
            service: self.service_category.clone(),
            supports,
        }
    }
}

/// Entry in the `ListConnectionTypes` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTypeDetails {
    /// Service category of the type.
    pub service: String,
    /// Operations the type supports.
    pub supports: Vec<&'static str>,
}

/// Immutable event-type → descriptor lookup.
pub struct ConnectionTypeRegistry {
    types: HashMap<String, ConnectionType>,
}

impl ConnectionTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Build a registry containing the built-in types enabled by config.
    pub fn from_config(config: &ConnectionTypesConfig) -> Self {
        let mut registry = Self::new();
        if config.webhook {
            registry.insert(ConnectionType {
                event_type: "org.roomlink.webhook".to_string(),
                service_category: "webhook".to_string(),
                capabilities: Capabilities::all(),
                required_fields: vec!["name".to_string()],
                secret_fields: vec!["token".to_string()],
                url_field: None,
            });
        }
        if config.feed {
            registry.insert(ConnectionType {
                event_type: "org.roomlink.feed".to_string(),
                service_category: "feed".to_string(),
                capabilities: Capabilities::all(),
                required_fields: vec!["url".to_string()],
                secret_fields: Vec::new(),
                url_field: Some("url".to_string()),
            });
        }
        if config.command {
            registry.insert(ConnectionType {
                event_type: "org.roomlink.command".to_string(),
                service_category: "command".to_string(),
                capabilities: Capabilities::all(),
                required_fields: vec!["commandPrefix".to_string()],
                secret_fields: Vec::new(),
                url_field: None,
            });
        }
        registry
    }

    /// Register a descriptor, replacing any previous one for the same key.
    pub fn insert(&mut self, ty: ConnectionType) {
        self.types.insert(ty.event_type.clone(), ty);
    }

    /// Resolve an event-type name to its descriptor.
    pub fn resolve_type(&self, event_type: &str) -> Option<&ConnectionType> {
        self.types.get(event_type)
    }

    /// All registered types, keyed by event type, in stable order.
    pub fn enabled(&self) -> BTreeMap<String, ConnectionTypeDetails> {
        self.types
            .iter()
            .map(|(key, ty)| (key.clone(), ty.details()))
            .collect()
    }
}

impl Default for ConnectionTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
