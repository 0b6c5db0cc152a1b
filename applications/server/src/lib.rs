//! Jukebox Server Library
//!
//! Venue playback rooms: patrons vote on a shared queue while a background
//! loop keeps the venue's remote player in step with it.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod jobs;
pub mod realtime;
pub mod rooms;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use credentials::CredentialManager;
pub use error::{CredentialError, Result, ServerError};
pub use jobs::Reconciler;
pub use rooms::{RoomHandle, RoomRegistry};
pub use state::AppState;
