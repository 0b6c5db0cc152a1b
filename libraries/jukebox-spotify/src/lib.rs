//! Jukebox Spotify client
//!
//! Stateless HTTP client for the parts of the Spotify Web API a venue room
//! needs: token exchange, track search and remote player control.
//!
//! # Features
//!
//! - **Tokens**: client credentials, authorization code and refresh flows
//! - **Catalog**: track search (capped at five results) and track lookup
//! - **Player**: state, devices, play, pause, resume, transfer, enqueue
//!
//! Every failure is mapped onto a [`RemoteServiceError`]; nothing is retried
//! here.
//!
//! # Example
//!
//! ```ignore
//! use jukebox_spotify::{MusicService, SpotifyClient, SpotifyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SpotifyConfig::new("client-id", "secret", "http://localhost:8888/callback");
//!     let client = SpotifyClient::new(config)?;
//!
//!     let grant = client.client_credentials_token().await?;
//!     for track in client.search_tracks(&grant.access_token, "daft punk").await? {
//!         println!("{} - {}", track.artist, track.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
mod error;
mod player;
mod service;
mod types;

pub use client::SpotifyClient;
pub use error::{ClientBuildError, RemoteErrorKind, RemoteServiceError, Result};
pub use service::MusicService;
pub use types::{
    Device, PlaybackState, SpotifyConfig, TokenGrant, Track, DEFAULT_ACCOUNTS_URL,
    DEFAULT_API_URL, DEFAULT_SCOPES, SEARCH_PAGE_SIZE,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use player::PlayerClient;
