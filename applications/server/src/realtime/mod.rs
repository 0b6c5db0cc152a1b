//! Realtime transport: room events over WebSocket.

pub mod events;
pub mod handlers;
pub mod hub;
pub mod ws;

pub use events::{ClientEvent, ServerEvent};
pub use handlers::RoomEvents;
pub use hub::RoomHub;
