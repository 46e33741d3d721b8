//! # roomlink-proto
//!
//! Protocol-level data model shared by the roomlink daemon and its tests:
//!
//! - Room and user identifiers with surface-syntax validation
//! - Room power-level state and per-user level resolution
//!
//! This crate is deliberately free of I/O. Everything network-facing lives in
//! the daemon, behind capability traits that consume these types.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod ids;
pub mod power_levels;

pub use ids::{IdParseError, RoomId, RoomIdExt, UserId, UserIdExt};
pub use power_levels::PowerLevels;
