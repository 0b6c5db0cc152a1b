//! The music service boundary the playback core is written against.

use crate::error::Result;
use crate::types::{Device, PlaybackState, TokenGrant, Track};
use async_trait::async_trait;
use jukebox_core::{DeviceId, TrackId};

/// Stateless facade over the remote streaming API.
///
/// Every call carries the token and identifiers it needs; implementations hold
/// no per-room state and never retry.
#[async_trait]
pub trait MusicService: Send + Sync {
    // ========================================================================
    // Tokens
    // ========================================================================

    /// Client-credentials token (catalog access only)
    async fn client_credentials_token(&self) -> Result<TokenGrant>;

    /// Exchange an authorization code for a user access + refresh token
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenGrant>;

    /// Exchange a refresh token for a new access token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// URL of the authorization page; `state` comes back on the callback
    fn authorize_url(&self, state: &str) -> String;

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Up to [`SEARCH_PAGE_SIZE`](crate::SEARCH_PAGE_SIZE) tracks matching `query`
    async fn search_tracks(&self, token: &str, query: &str) -> Result<Vec<Track>>;

    async fn get_track(&self, token: &str, track_id: &TrackId) -> Result<Track>;

    // ========================================================================
    // Player
    // ========================================================================

    /// Current player state, `None` when nothing is loaded anywhere
    async fn playback_state(&self, token: &str) -> Result<Option<PlaybackState>>;

    async fn devices(&self, token: &str) -> Result<Vec<Device>>;

    /// Replace whatever is playing on `device` with `track_id`
    async fn play_track(&self, token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()>;

    async fn resume(&self, token: &str, device: &DeviceId) -> Result<()>;

    async fn pause(&self, token: &str, device: &DeviceId) -> Result<()>;

    /// Move playback to `device`, optionally starting it
    async fn transfer_playback(&self, token: &str, device: &DeviceId, play: bool) -> Result<()>;

    /// Add `track_id` to the player's own up-next queue
    async fn enqueue(&self, token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()>;
}
