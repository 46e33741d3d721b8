//! Room and user identifier validation utilities.
//!
//! Room ids have the surface form `!localpart:domain`, user ids the form
//! `@localpart:domain`. Validation here is purely syntactic: both sides of
//! the separating colon must be non-empty. Whether the room or user actually
//! exists is the homeserver's business.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum identifier length, including the sigil.
pub const MAX_ID_LEN: usize = 255;

/// Error returned when parsing a [`RoomId`] or [`UserId`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// The string is not of the form `!localpart:domain`.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),
    /// The string is not of the form `@localpart:domain`.
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

/// Check that `s` is `<sigil><localpart>:<domain>` with both parts non-empty.
fn has_sigil_form(s: &str, sigil: char) -> bool {
    if s.len() > MAX_ID_LEN {
        return false;
    }
    let rest = match s.strip_prefix(sigil) {
        Some(rest) => rest,
        None => return false,
    };
    match rest.find(':') {
        Some(idx) => idx >= 1 && idx + 1 < rest.len(),
        None => false,
    }
}

/// Extension trait for checking if a string is a valid room id.
pub trait RoomIdExt {
    /// Check if this string has the `!localpart:domain` surface form.
    ///
    /// # Examples
    ///
    /// ```
    /// use roomlink_proto::RoomIdExt;
    ///
    /// assert!("!abc:example.org".is_room_id());
    /// assert!(!"not-a-room-id".is_room_id());
    /// assert!(!"!:example.org".is_room_id());
    /// assert!(!"!abc:".is_room_id());
    /// ```
    fn is_room_id(&self) -> bool;
}

impl RoomIdExt for &str {
    fn is_room_id(&self) -> bool {
        has_sigil_form(self, '!')
    }
}

impl RoomIdExt for String {
    fn is_room_id(&self) -> bool {
        self.as_str().is_room_id()
    }
}

/// Extension trait for checking if a string is a valid user id.
pub trait UserIdExt {
    /// Check if this string has the `@localpart:domain` surface form.
    ///
    /// # Examples
    ///
    /// ```
    /// use roomlink_proto::UserIdExt;
    ///
    /// assert!("@alice:example.org".is_user_id());
    /// assert!(!"alice".is_user_id());
    /// ```
    fn is_user_id(&self) -> bool;
}

impl UserIdExt for &str {
    fn is_user_id(&self) -> bool {
        has_sigil_form(self, '@')
    }
}

impl UserIdExt for String {
    fn is_user_id(&self) -> bool {
        self.as_str().is_user_id()
    }
}

/// An owned, validated room id (`!localpart:domain`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RoomId(String);

impl RoomId {
    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_room_id() {
            Ok(Self(s.to_string()))
        } else {
            Err(IdParseError::InvalidRoomId(s.to_string()))
        }
    }
}

impl TryFrom<String> for RoomId {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_room_id() {
            Ok(Self(s))
        } else {
            Err(IdParseError::InvalidRoomId(s))
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An owned, validated user id (`@localpart:domain`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserId(String);

impl UserId {
    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_user_id() {
            Ok(Self(s.to_string()))
        } else {
            Err(IdParseError::InvalidUserId(s.to_string()))
        }
    }
}

impl TryFrom<String> for UserId {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_user_id() {
            Ok(Self(s))
        } else {
            Err(IdParseError::InvalidUserId(s))
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
