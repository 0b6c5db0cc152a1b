/// Server configuration
use crate::error::{Result, ServerError};
use jukebox_spotify::{SpotifyConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL, DEFAULT_SCOPES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_spotify")]
    pub spotify: SpotifySettings,

    #[serde(default = "default_session")]
    pub session: SessionSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Where browsers are sent after authorization (`{frontend_url}/shop/{room}`)
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Staging window opens when this much of the current track is left
    #[serde(default = "default_prestage_threshold_ms")]
    pub prestage_threshold_ms: u64,

    /// The staged track is handed to the player at or below this
    #[serde(default = "default_commit_threshold_ms")]
    pub commit_threshold_ms: u64,

    /// Validity window granted to a fresh user token
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_metadata_cache_size")]
    pub metadata_cache_size: usize,
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (or `config.toml`) and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(ServerError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        // Override with environment variables, e.g. JUKEBOX_SPOTIFY__CLIENT_ID
        settings = settings.add_source(
            config::Environment::with_prefix("JUKEBOX")
                .prefix_separator("_")
                .separator("__")
                .list_separator(" ")
                .with_list_parse_key("spotify.scopes")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.spotify.client_id.is_empty() || self.spotify.client_secret.is_empty() {
            return Err(ServerError::Config(
                "Spotify credentials are required (set JUKEBOX_SPOTIFY__CLIENT_ID and JUKEBOX_SPOTIFY__CLIENT_SECRET)"
                    .to_string(),
            ));
        }

        if self.session.jwt_secret.is_empty() {
            return Err(ServerError::Config(
                "JWT secret is required (set JUKEBOX_SESSION__JWT_SECRET)".to_string(),
            ));
        }

        if self.playback.tick_interval_secs == 0 {
            return Err(ServerError::Config(
                "playback.tick_interval_secs must be positive".to_string(),
            ));
        }

        if self.playback.commit_threshold_ms >= self.playback.prestage_threshold_ms {
            return Err(ServerError::Config(format!(
                "playback.commit_threshold_ms ({}) must be below playback.prestage_threshold_ms ({})",
                self.playback.commit_threshold_ms, self.playback.prestage_threshold_ms
            )));
        }

        Ok(())
    }

    pub fn spotify_config(&self) -> SpotifyConfig {
        let mut config = SpotifyConfig::new(
            self.spotify.client_id.clone(),
            self.spotify.client_secret.clone(),
            self.spotify.redirect_uri.clone(),
        )
        .with_base_urls(self.spotify.accounts_url.clone(), self.spotify.api_url.clone());
        config.scopes = self.spotify.scopes.clone();
        config
    }
}

impl PlaybackSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        frontend_url: default_frontend_url(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_spotify() -> SpotifySettings {
    SpotifySettings {
        client_id: String::new(),
        client_secret: String::new(),
        redirect_uri: default_redirect_uri(),
        accounts_url: default_accounts_url(),
        api_url: default_api_url(),
        scopes: default_scopes(),
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_accounts_url() -> String {
    DEFAULT_ACCOUNTS_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
}

fn default_session() -> SessionSettings {
    SessionSettings {
        jwt_secret: String::new(),
        jwt_expiration_hours: default_jwt_expiration_hours(),
    }
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        tick_interval_secs: default_tick_interval_secs(),
        prestage_threshold_ms: default_prestage_threshold_ms(),
        commit_threshold_ms: default_commit_threshold_ms(),
        token_lifetime_secs: default_token_lifetime_secs(),
    }
}

fn default_tick_interval_secs() -> u64 {
    8
}

fn default_prestage_threshold_ms() -> u64 {
    40_000
}

fn default_commit_threshold_ms() -> u64 {
    12_000
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        metadata_cache_size: default_metadata_cache_size(),
    }
}

fn default_metadata_cache_size() -> usize {
    512
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            spotify: default_spotify(),
            session: default_session(),
            playback: default_playback(),
            catalog: default_catalog(),
        }
    }
}
