//! Homeserver and service-presence capabilities.
//!
//! The provisioning core never talks to a homeserver directly. It consumes
//! two capabilities:
//!
//! - [`ChatClient`]: "who does this token belong to" and "what are this
//!   room's power levels" lookups.
//! - [`BotRegistry`]: which service identities are currently joined to which
//!   rooms, and for which service categories.
//!
//! Production wiring uses [`http::HttpChatClient`] and [`StaticBotRegistry`];
//! tests substitute mocks.

pub mod http;

pub use http::HttpChatClient;

use crate::config::BotBlock;
use async_trait::async_trait;
use dashmap::DashMap;
use roomlink_proto::{PowerLevels, RoomId, UserId};
use std::collections::HashSet;
use thiserror::Error;

/// Failure of a homeserver lookup.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The queried resource does not exist on the homeserver.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential was rejected by the homeserver.
    #[error("unauthorized")]
    Unauthorized,

    /// Network or protocol failure.
    #[error("homeserver lookup failed: {0}")]
    Lookup(#[source] anyhow::Error),
}

/// Chat-protocol client capability.
///
/// Implementations perform one network call per method, no retries. Callers
/// translate failures into the provisioning error taxonomy.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Resolve the identity a bearer token belongs to.
    ///
    /// Returns the raw identity string as reported by the homeserver; the
    /// caller is responsible for surface validation.
    async fn whoami(&self, token: &str) -> Result<String, ClientError>;

    /// Fetch a room's power-level state.
    async fn power_levels(&self, room: &RoomId) -> Result<PowerLevels, ClientError>;
}

/// Service-presence capability: which bot identity, if any, can act in a
/// room for a given service category.
pub trait BotRegistry: Send + Sync {
    /// The first eligible service identity joined to `room`.
    ///
    /// With `category = None` any joined bot qualifies; otherwise the bot
    /// must serve that category.
    fn bot_in_room(&self, room: &RoomId, category: Option<&str>) -> Option<UserId>;
}

/// In-memory bot registry backed by the configured bot blocks.
///
/// Join state is tracked at runtime via [`mark_joined`](Self::mark_joined) /
/// [`mark_left`](Self::mark_left); bot eligibility order follows config
/// declaration order.
pub struct StaticBotRegistry {
    bots: Vec<BotBlock>,
    joined: DashMap<RoomId, HashSet<UserId>>,
}

impl StaticBotRegistry {
    /// Create a registry from configured bot blocks.
    pub fn new(bots: Vec<BotBlock>) -> Self {
        Self {
            bots,
            joined: DashMap::new(),
        }
    }

    /// Record that `bot` has joined `room`.
    pub fn mark_joined(&self, room: RoomId, bot: UserId) {
        self.joined.entry(room).or_default().insert(bot);
    }

    /// Record that `bot` has left `room`.
    pub fn mark_left(&self, room: &RoomId, bot: &UserId) {
        if let Some(mut members) = self.joined.get_mut(room) {
            members.remove(bot);
        }
    }
}

impl BotRegistry for StaticBotRegistry {
    fn bot_in_room(&self, room: &RoomId, category: Option<&str>) -> Option<UserId> {
        let members = self.joined.get(room)?;
        self.bots
            .iter()
            .filter(|bot| match category {
                Some(cat) => bot.serves(cat),
                None => true,
            })
            .find(|bot| members.contains(&bot.user_id))
            .map(|bot| bot.user_id.clone())
    }
}
