mod identity;
mod ids;

pub use identity::{Identity, Role};
pub use ids::{ConnectionId, DeviceId, PatronId, RoomId, TrackId, GUEST};
