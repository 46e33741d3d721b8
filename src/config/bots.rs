//! Service bot blocks.

use roomlink_proto::UserId;
use serde::Deserialize;

/// A service bot identity the daemon can act through.
///
/// A bot with an empty `categories` list is a generalist: it is eligible for
/// any service category. Bots with categories only serve those categories.
#[derive(Debug, Clone, Deserialize)]
pub struct BotBlock {
    /// The bot's user id on the homeserver.
    pub user_id: UserId,
    /// Service categories this bot serves (empty = all).
    #[serde(default)]
    pub categories: Vec<String>,
}

impl BotBlock {
    /// Whether this bot can act for the given service category.
    pub fn serves(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generalist_serves_everything() {
        let bot = BotBlock {
            user_id: "@roomlink:test".parse().expect("valid user id"),
            categories: Vec::new(),
        };
        assert!(bot.serves("webhook"));
        assert!(bot.serves("feed"));
    }

    #[test]
    fn specialist_serves_only_its_categories() {
        let bot = BotBlock {
            user_id: "@feeds:test".parse().expect("valid user id"),
            categories: vec!["feed".to_string()],
        };
        assert!(bot.serves("feed"));
        assert!(!bot.serves("webhook"));
    }
}
