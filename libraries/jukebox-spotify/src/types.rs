//! Types for music service requests and responses.

use jukebox_core::{DeviceId, TrackId};
use serde::{Deserialize, Serialize};

/// Production endpoints of the Spotify accounts service
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
/// Production endpoints of the Spotify Web API
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
/// Scopes needed to read and drive a venue's player
pub const DEFAULT_SCOPES: &[&str] = &["user-read-playback-state", "user-modify-playback-state"];

/// Search results and catalog pages are capped at this many tracks.
pub const SEARCH_PAGE_SIZE: usize = 5;

/// Configuration for talking to the music service.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the service for the authorization-code flow
    pub redirect_uri: String,
    /// Base URL of the accounts service (token exchange, authorize page)
    pub accounts_url: String,
    /// Base URL of the Web API
    pub api_url: String,
    pub scopes: Vec<String>,
}

impl SpotifyConfig {
    /// Config pointing at the production service.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Override both base URLs (used against mock servers).
    pub fn with_base_urls(mut self, accounts_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.accounts_url = accounts_url.into();
        self.api_url = api_url.into();
        self
    }
}

// =============================================================================
// Public domain types
// =============================================================================

/// Token issued by the accounts service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Present for the authorization-code flow, and on refresh when rotated
    pub refresh_token: Option<String>,
    /// Validity reported by the service, in seconds
    pub expires_in: u64,
}

/// Display metadata of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: TrackId,
    pub name: String,
    /// First credited artist
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    /// Largest album cover, when the service has one
    pub image: Option<String>,
}

/// What the remote player reports it is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub progress_ms: u64,
    /// Current track; absent for ads, local files and between tracks
    pub item: Option<Track>,
    pub device_id: Option<DeviceId>,
}

impl PlaybackState {
    /// Milliseconds left in the current track, if a track with a known
    /// duration is loaded.
    pub fn remaining_ms(&self) -> Option<u64> {
        self.item
            .as_ref()
            .map(|track| track.duration_ms.saturating_sub(self.progress_ms))
    }
}

/// A controllable playback endpoint of the authorized account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub is_active: bool,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
}

impl From<TokenResponse> for TokenGrant {
    fn from(raw: TokenResponse) -> Self {
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    #[serde(default)]
    pub album: Option<RawAlbum>,
}

impl RawTrack {
    pub fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let (album, image) = match self.album {
            Some(album) => {
                let image = album.images.into_iter().next().map(|i| i.url);
                (album.name, image)
            }
            None => (String::new(), None),
        };

        Some(Track {
            track_id: TrackId::new(id),
            name: self.name,
            artist: self
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album,
            duration_ms: self.duration_ms,
            image,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default)]
    pub items: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: RawPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDevice {
    /// Restricted devices report no id
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl RawDevice {
    pub fn into_device(self) -> Option<Device> {
        Some(Device {
            id: DeviceId::new(self.id?),
            name: self.name,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlayback {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<RawTrack>,
    #[serde(default)]
    pub device: Option<RawDevice>,
}

impl From<RawPlayback> for PlaybackState {
    fn from(raw: RawPlayback) -> Self {
        Self {
            is_playing: raw.is_playing,
            progress_ms: raw.progress_ms.unwrap_or_default(),
            item: raw.item.and_then(RawTrack::into_track),
            device_id: raw.device.and_then(|d| d.id).map(DeviceId::new),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PlayRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransferRequest {
    pub device_ids: Vec<String>,
    pub play: bool,
}
