//! Unified error handling for roomlinkd.
//!
//! Every failure raised while handling a provisioning operation is shaped
//! into a [`ProvisioningError`] before it reaches the caller: a stable kind
//! code plus a human-readable message, and nothing else. Internal causes are
//! logged, never exposed.

use roomlink_proto::IdParseError;
use thiserror::Error;

/// Errors that can occur while handling a provisioning operation.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Credential missing, malformed, or the identity lookup failed.
    #[error("{0}")]
    BadToken(String),

    /// Structurally invalid input (room id, user id, body shape).
    #[error("{0}")]
    BadValue(String),

    /// Caller's room standing is below the provisioning threshold, or the
    /// room has no power-level state to prove standing with.
    #[error("unauthorized")]
    Forbidden,

    /// No eligible service identity is present in the target room.
    #[error("bot is not joined to the room")]
    NotInRoom,

    /// Connection, connection type, or room resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The connection type does not support the requested operation.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// A cross-connection invariant was violated (command prefix collision).
    #[error("{0}")]
    ConflictingConnection(String),

    /// Unexpected collaborator failure. The cause is logged server-side;
    /// callers only ever see the kind and a generic message.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ProvisioningError {
    /// Get a static kind code for metrics labeling and response shaping.
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadToken(_) => "bad_token",
            Self::BadValue(_) => "bad_value",
            Self::Forbidden => "forbidden",
            Self::NotInRoom => "not_in_room",
            Self::NotFound(_) => "not_found",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::ConflictingConnection(_) => "conflicting_connection",
            Self::Internal(_) => "internal",
        }
    }

    /// The (kind, message) pair exposed to callers.
    ///
    /// `Internal` deliberately discards its cause here.
    pub fn to_response(&self) -> (&'static str, String) {
        (self.code(), self.to_string())
    }
}

impl From<IdParseError> for ProvisioningError {
    fn from(err: IdParseError) -> Self {
        Self::BadValue(err.to_string())
    }
}

/// Result type for provisioning operations.
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;
