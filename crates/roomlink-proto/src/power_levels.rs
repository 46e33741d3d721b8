//! Room power-level state.
//!
//! A room's power-level state maps user ids to numeric standing and declares
//! a default for users without an explicit entry. This crate only models the
//! fields relevant to provisioning authorization; the full state event
//! carries more.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Power-level state for a single room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerLevels {
    /// Explicit per-user levels.
    #[serde(default)]
    pub users: HashMap<UserId, i64>,
    /// Level for users without an explicit entry (0 if undeclared).
    #[serde(default)]
    pub users_default: i64,
}

impl PowerLevels {
    /// Resolve the effective level for `user`.
    ///
    /// Falls back to `users_default` when the user has no explicit entry.
    pub fn user_level(&self, user: &UserId) -> i64 {
        self.users.get(user).copied().unwrap_or(self.users_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        s.parse().expect("valid user id")
    }

    #[test]
    fn explicit_entry_wins_over_default() {
        let mut levels = PowerLevels {
            users_default: 10,
            ..Default::default()
        };
        levels.users.insert(user("@admin:example.org"), 100);

        assert_eq!(levels.user_level(&user("@admin:example.org")), 100);
        assert_eq!(levels.user_level(&user("@guest:example.org")), 10);
    }

    #[test]
    fn undeclared_default_is_zero() {
        let levels = PowerLevels::default();
        assert_eq!(levels.user_level(&user("@anyone:example.org")), 0);
    }

    #[test]
    fn deserializes_from_state_event_content() {
        let levels: PowerLevels = serde_json::from_str(
            r#"{"users": {"@mod:example.org": 90}, "users_default": 0, "ban": 50}"#,
        )
        .expect("extra fields are ignored");
        assert_eq!(levels.user_level(&user("@mod:example.org")), 90);
        assert_eq!(levels.user_level(&user("@other:example.org")), 0);
    }
}
