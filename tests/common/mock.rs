//! Mock homeserver client.
//!
//! Serves canned whoami/power-level answers and counts lookups, so tests can
//! assert that short-circuit paths never reach the network.

use async_trait::async_trait;
use roomlink_proto::{PowerLevels, RoomId};
use roomlinkd::client::{ChatClient, ClientError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`ChatClient`] with per-method call counters.
#[derive(Default)]
pub struct MockChatClient {
    tokens: HashMap<String, String>,
    power_levels: HashMap<RoomId, PowerLevels>,
    whoami_calls: AtomicUsize,
    power_level_calls: AtomicUsize,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token as belonging to `user_id` (raw identity string, so
    /// tests can feed malformed identities through).
    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(token.to_string(), user_id.to_string());
        self
    }

    /// Give `user_id` an explicit power level in `room`.
    pub fn with_power_level(mut self, room: &RoomId, user_id: &str, level: i64) -> Self {
        let levels = self.power_levels.entry(room.clone()).or_default();
        levels
            .users
            .insert(user_id.parse().expect("valid user id"), level);
        self
    }

    /// Declare power-level state for `room` without any explicit entries.
    pub fn with_empty_power_levels(mut self, room: &RoomId) -> Self {
        self.power_levels.entry(room.clone()).or_default();
        self
    }

    pub fn whoami_calls(&self) -> usize {
        self.whoami_calls.load(Ordering::SeqCst)
    }

    pub fn power_level_calls(&self) -> usize {
        self.power_level_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn whoami(&self, token: &str) -> Result<String, ClientError> {
        self.whoami_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .cloned()
            .ok_or(ClientError::Unauthorized)
    }

    async fn power_levels(&self, room: &RoomId) -> Result<PowerLevels, ClientError> {
        self.power_level_calls.fetch_add(1, Ordering::SeqCst);
        self.power_levels
            .get(room)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(room.to_string()))
    }
}
