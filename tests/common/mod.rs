//! Integration test common infrastructure.
//!
//! Provides a mock homeserver client and a builder for a fully wired
//! provisioner backed by in-memory state.

// Each test binary compiles this module; not every binary uses every helper.
#![allow(dead_code)]

pub mod mock;

#[allow(unused_imports)]
pub use mock::MockChatClient;

use roomlink_proto::{RoomId, UserId};
use roomlinkd::client::{BotRegistry, ChatClient, StaticBotRegistry};
use roomlinkd::config::{BotBlock, ConnectionTypesConfig, ProvisioningConfig};
use roomlinkd::directory::ConnectionDirectory;
use roomlinkd::provisioner::Provisioner;
use roomlinkd::registry::{Capabilities, ConnectionType, ConnectionTypeRegistry};
use std::sync::Arc;

/// Shared secret every harness accepts.
pub const TEST_SECRET: &str = "Test-Provisioning-Secret-2026";

/// The generalist bot identity registered in every harness. Also the
/// identity shared-secret callers act as.
pub const BOT_USER: &str = "@roomlink:test";

pub fn room(s: &str) -> RoomId {
    s.parse().expect("valid room id")
}

pub fn user(s: &str) -> UserId {
    s.parse().expect("valid user id")
}

/// `Authorization` header value for a bearer token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// A provisioner wired to mocks, plus handles for assertions.
pub struct TestHarness {
    pub provisioner: Arc<Provisioner>,
    pub client: Arc<MockChatClient>,
    pub bots: Arc<StaticBotRegistry>,
}

impl TestHarness {
    /// Wire a provisioner around the given mock client.
    ///
    /// The registry carries the built-in types plus `org.roomlink.sealed`,
    /// a readable type that rejects updates.
    pub fn new(mock: MockChatClient) -> Self {
        let client = Arc::new(mock);
        let bots = Arc::new(StaticBotRegistry::new(vec![BotBlock {
            user_id: user(BOT_USER),
            categories: Vec::new(),
        }]));

        let mut registry = ConnectionTypeRegistry::from_config(&ConnectionTypesConfig::default());
        registry.insert(ConnectionType {
            event_type: "org.roomlink.sealed".to_string(),
            service_category: "sealed".to_string(),
            capabilities: Capabilities {
                read_details: true,
                update: false,
                remove: true,
            },
            required_fields: Vec::new(),
            secret_fields: Vec::new(),
            url_field: None,
        });
        let registry = Arc::new(registry);

        let directory = Arc::new(ConnectionDirectory::new(
            registry.clone(),
            vec!["!roomlink".to_string()],
        ));

        let provisioning = ProvisioningConfig {
            secret: TEST_SECRET.to_string(),
            service_user_id: user(BOT_USER),
            reserved_prefixes: vec!["!roomlink".to_string()],
        };

        let provisioner = Arc::new(Provisioner::new(
            &provisioning,
            client.clone() as Arc<dyn ChatClient>,
            bots.clone() as Arc<dyn BotRegistry>,
            registry,
            directory,
        ));

        Self {
            provisioner,
            client,
            bots,
        }
    }

    /// Mark the harness bot as joined to `room_id`.
    pub fn join_bot(&self, room_id: &RoomId) {
        self.bots.mark_joined(room_id.clone(), user(BOT_USER));
    }
}
