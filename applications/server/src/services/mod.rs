/// Server services
pub mod catalog;
pub mod player;
pub mod session;

pub use catalog::{QueueSnapshot, SnapshotEntry, TrackCatalog};
pub use player::{PlaybackAction, PlayerCommand, PlayerControl};
pub use session::JwtSessionDirectory;
