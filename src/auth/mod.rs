//! Authentication and authorization.
//!
//! Two tiers, run in order for every room-scoped operation:
//!
//! 1. [`identity::IdentityResolver`] turns the request credential into an
//!    [`identity::AuthContext`] (shared secret or bearer token).
//! 2. [`permissions::PermissionGate`] proves the caller's standing in the
//!    target room via its power-level state.
//!
//! Neither tier caches anything across requests.

mod identity;
mod permissions;

pub use identity::{AuthContext, IdentityResolver};
pub use permissions::{PermissionGate, PermissionLevel, PROVISIONING_POWER_LEVEL};
