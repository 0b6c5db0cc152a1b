//! Room Registry: the only owner of playback rooms.

mod registry;
mod room;

pub use registry::{RoomHandle, RoomRegistry, TickGuard};
pub use room::{AccessToken, CredentialPhase, Credentials, Room};
