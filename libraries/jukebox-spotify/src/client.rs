//! Main Spotify Web API client.

use crate::auth::AuthClient;
use crate::catalog::CatalogClient;
use crate::error::{ClientBuildError, Result};
use crate::player::PlayerClient;
use crate::service::MusicService;
use crate::types::{Device, PlaybackState, SpotifyConfig, TokenGrant, Track};
use async_trait::async_trait;
use jukebox_core::{DeviceId, TrackId};
use reqwest::Client;
use std::time::Duration;

/// HTTP implementation of [`MusicService`].
///
/// Holds the application credentials and a shared connection pool. Tokens are
/// passed per call, so a single client serves every room.
///
/// # Example
///
/// ```ignore
/// use jukebox_spotify::{MusicService, SpotifyClient, SpotifyConfig};
///
/// let config = SpotifyConfig::new("client-id", "secret", "http://localhost:8888/callback");
/// let client = SpotifyClient::new(config)?;
///
/// let grant = client.client_credentials_token().await?;
/// let tracks = client.search_tracks(&grant.access_token, "daft punk").await?;
/// ```
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
}

impl SpotifyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SpotifyConfig) -> std::result::Result<Self, ClientBuildError> {
        let accounts_url = normalize_url(&config.accounts_url)?;
        let api_url = normalize_url(&config.api_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Jukebox/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: SpotifyConfig {
                accounts_url,
                api_url,
                ..config
            },
        })
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Token endpoints.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.config)
    }

    /// Catalog endpoints for the given token.
    pub fn catalog<'a>(&'a self, access_token: &'a str) -> CatalogClient<'a> {
        CatalogClient::new(&self.http, &self.config.api_url, access_token)
    }

    /// Player endpoints for the given user token.
    pub fn player<'a>(&'a self, access_token: &'a str) -> PlayerClient<'a> {
        PlayerClient::new(&self.http, &self.config.api_url, access_token)
    }
}

fn normalize_url(raw: &str) -> std::result::Result<String, ClientBuildError> {
    if raw.is_empty() {
        return Err(ClientBuildError::InvalidUrl("URL cannot be empty".into()));
    }

    let trimmed = raw.trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|e| ClientBuildError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ClientBuildError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    Ok(trimmed.to_string())
}

#[async_trait]
impl MusicService for SpotifyClient {
    async fn client_credentials_token(&self) -> Result<TokenGrant> {
        self.auth().client_credentials().await
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenGrant> {
        self.auth().authorization_code(code).await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.auth().refresh(refresh_token).await
    }

    fn authorize_url(&self, state: &str) -> String {
        self.auth().authorize_url(state)
    }

    async fn search_tracks(&self, token: &str, query: &str) -> Result<Vec<Track>> {
        self.catalog(token).search(query).await
    }

    async fn get_track(&self, token: &str, track_id: &TrackId) -> Result<Track> {
        self.catalog(token).get_track(track_id).await
    }

    async fn playback_state(&self, token: &str) -> Result<Option<PlaybackState>> {
        self.player(token).state().await
    }

    async fn devices(&self, token: &str) -> Result<Vec<Device>> {
        self.player(token).devices().await
    }

    async fn play_track(&self, token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        self.player(token).play(device, track_id).await
    }

    async fn resume(&self, token: &str, device: &DeviceId) -> Result<()> {
        self.player(token).resume(device).await
    }

    async fn pause(&self, token: &str, device: &DeviceId) -> Result<()> {
        self.player(token).pause(device).await
    }

    async fn transfer_playback(&self, token: &str, device: &DeviceId, play: bool) -> Result<()> {
        self.player(token).transfer(device, play).await
    }

    async fn enqueue(&self, token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        self.player(token).enqueue(device, track_id).await
    }
}
