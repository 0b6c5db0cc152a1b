//! Jukebox Core
//!
//! Identifier types and collaborator traits shared by the Jukebox crates.
//!
//! # Example
//!
//! ```rust
//! use jukebox_core::{Identity, PatronId, RoomId};
//!
//! let clerk = Identity::clerk("alice", "7");
//! assert!(clerk.controls(&RoomId::new("7")));
//! assert!(PatronId::guest().is_guest());
//! ```

#![forbid(unsafe_code)]

pub mod session;
pub mod types;

pub use session::SessionDirectory;
pub use types::{ConnectionId, DeviceId, Identity, PatronId, Role, RoomId, TrackId, GUEST};
