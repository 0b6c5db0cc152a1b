/// Common test utilities and fixtures
use async_trait::async_trait;
use jukebox_core::{ConnectionId, DeviceId, Identity, RoomId, TrackId};
use jukebox_server::{config::ServerConfig, services::JwtSessionDirectory, AppState, RoomHandle};
use jukebox_spotify::{
    Device, MusicService, PlaybackState, RemoteServiceError, Result, TokenGrant, Track,
    SEARCH_PAGE_SIZE,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

pub const JWT_SECRET: &str = "test-secret-key";
pub const USER_TOKEN: &str = "user-token";
pub const REFRESH_TOKEN: &str = "refresh-token";
pub const FRONTEND_URL: &str = "http://frontend.test";

/// Every call the fake received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ClientToken,
    ExchangeCode(String),
    Refresh(String),
    Search(String),
    GetTrack(TrackId),
    PlaybackState,
    Devices,
    Play(DeviceId, TrackId),
    Resume(DeviceId),
    Pause(DeviceId),
    Transfer(DeviceId, bool),
    Enqueue(DeviceId, TrackId),
}

impl Call {
    pub fn is_player_command(&self) -> bool {
        matches!(
            self,
            Call::Play(..) | Call::Resume(_) | Call::Pause(_) | Call::Transfer(..) | Call::Enqueue(..)
        )
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    /// Metadata the catalog knows, keyed by id
    pub catalog: BTreeMap<TrackId, Track>,
    pub playback: Option<PlaybackState>,
    pub playback_error: Option<RemoteServiceError>,
    pub devices: Vec<Device>,
    /// Commands against these devices fail as unavailable
    pub gone_devices: HashSet<DeviceId>,
    /// Play and enqueue of these tracks fail as a bad request
    pub refused_tracks: HashSet<TrackId>,
    pub exchange_error: Option<RemoteServiceError>,
    pub refresh_error: Option<RemoteServiceError>,
    /// Number of upcoming catalog calls answered with Unauthorized
    pub catalog_rejections: usize,
    pub client_tokens_issued: usize,
    pub refreshes_issued: usize,
}

/// In-memory music service recording every call
#[derive(Debug, Default)]
pub struct FakeMusicService {
    state: Mutex<FakeState>,
}

impl FakeMusicService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|state| state.calls.clone())
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.with(|state| state.calls.iter().filter(|call| predicate(call)).count())
    }

    pub fn clear_calls(&self) {
        self.with(|state| state.calls.clear());
    }

    pub fn add_track(&self, id: &str, duration_ms: u64) {
        self.with(|state| {
            state.catalog.insert(TrackId::new(id), track(id, duration_ms));
        });
    }

    pub fn add_device(&self, id: &str) {
        self.with(|state| {
            state.devices.push(Device {
                id: DeviceId::new(id),
                name: format!("Speaker {}", id),
                is_active: false,
            });
        });
    }

    pub fn set_playing(&self, id: &str, duration_ms: u64, progress_ms: u64) {
        self.with(|state| {
            state.playback = Some(PlaybackState {
                is_playing: true,
                progress_ms,
                item: Some(track(id, duration_ms)),
                device_id: None,
            });
        });
    }

    pub fn set_paused(&self, id: &str) {
        self.with(|state| {
            state.playback = Some(PlaybackState {
                is_playing: false,
                progress_ms: 0,
                item: Some(track(id, 200_000)),
                device_id: None,
            });
        });
    }

    pub fn set_idle(&self) {
        self.with(|state| state.playback = None);
    }

    fn record(&self, call: Call) {
        self.with(|state| state.calls.push(call));
    }

    fn command(&self, call: Call, device: &DeviceId, track_id: Option<&TrackId>) -> Result<()> {
        self.with(|state| {
            state.calls.push(call);
            if state.gone_devices.contains(device) {
                Err(RemoteServiceError::DeviceUnavailable(format!(
                    "Device {} not found",
                    device
                )))
            } else if track_id.is_some_and(|id| state.refused_tracks.contains(id)) {
                Err(RemoteServiceError::Transient(
                    "400 Bad Request: Invalid track uri".to_string(),
                ))
            } else {
                Ok(())
            }
        })
    }

    fn catalog_rejection(state: &mut FakeState) -> Option<RemoteServiceError> {
        if state.catalog_rejections > 0 {
            state.catalog_rejections -= 1;
            Some(RemoteServiceError::Unauthorized("token expired".to_string()))
        } else {
            None
        }
    }
}

#[async_trait]
impl MusicService for FakeMusicService {
    async fn client_credentials_token(&self) -> Result<TokenGrant> {
        self.with(|state| {
            state.calls.push(Call::ClientToken);
            state.client_tokens_issued += 1;
            Ok(TokenGrant {
                access_token: format!("client-token-{}", state.client_tokens_issued),
                refresh_token: None,
                expires_in: 3600,
            })
        })
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenGrant> {
        self.with(|state| {
            state.calls.push(Call::ExchangeCode(code.to_string()));
            match &state.exchange_error {
                Some(e) => Err(e.clone()),
                None => Ok(TokenGrant {
                    access_token: USER_TOKEN.to_string(),
                    refresh_token: Some(REFRESH_TOKEN.to_string()),
                    expires_in: 3600,
                }),
            }
        })
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.with(|state| {
            state.calls.push(Call::Refresh(refresh_token.to_string()));
            match &state.refresh_error {
                Some(e) => Err(e.clone()),
                None => {
                    state.refreshes_issued += 1;
                    Ok(TokenGrant {
                        access_token: format!("{}-{}", USER_TOKEN, state.refreshes_issued),
                        refresh_token: None,
                        expires_in: 3600,
                    })
                }
            }
        })
    }

    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.test/authorize?response_type=code&state={}", state)
    }

    async fn search_tracks(&self, _token: &str, query: &str) -> Result<Vec<Track>> {
        self.with(|state| {
            state.calls.push(Call::Search(query.to_string()));
            if let Some(e) = Self::catalog_rejection(state) {
                return Err(e);
            }
            Ok(state
                .catalog
                .values()
                .take(SEARCH_PAGE_SIZE)
                .cloned()
                .collect())
        })
    }

    async fn get_track(&self, _token: &str, track_id: &TrackId) -> Result<Track> {
        self.with(|state| {
            state.calls.push(Call::GetTrack(track_id.clone()));
            if let Some(e) = Self::catalog_rejection(state) {
                return Err(e);
            }
            state
                .catalog
                .get(track_id)
                .cloned()
                .ok_or_else(|| RemoteServiceError::NotFound(track_id.to_string()))
        })
    }

    async fn playback_state(&self, _token: &str) -> Result<Option<PlaybackState>> {
        self.with(|state| {
            state.calls.push(Call::PlaybackState);
            match &state.playback_error {
                Some(e) => Err(e.clone()),
                None => Ok(state.playback.clone()),
            }
        })
    }

    async fn devices(&self, _token: &str) -> Result<Vec<Device>> {
        self.record(Call::Devices);
        Ok(self.with(|state| state.devices.clone()))
    }

    async fn play_track(&self, _token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        self.command(Call::Play(device.clone(), track_id.clone()), device, Some(track_id))
    }

    async fn resume(&self, _token: &str, device: &DeviceId) -> Result<()> {
        self.command(Call::Resume(device.clone()), device, None)
    }

    async fn pause(&self, _token: &str, device: &DeviceId) -> Result<()> {
        self.command(Call::Pause(device.clone()), device, None)
    }

    async fn transfer_playback(&self, _token: &str, device: &DeviceId, play: bool) -> Result<()> {
        self.command(Call::Transfer(device.clone(), play), device, None)
    }

    async fn enqueue(&self, _token: &str, device: &DeviceId, track_id: &TrackId) -> Result<()> {
        self.command(Call::Enqueue(device.clone(), track_id.clone()), device, Some(track_id))
    }
}

pub fn track(id: &str, duration_ms: u64) -> Track {
    Track {
        track_id: TrackId::new(id),
        name: format!("Song {}", id),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        duration_ms,
        image: None,
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.server.frontend_url = FRONTEND_URL.to_string();
    config.session.jwt_secret = JWT_SECRET.to_string();
    config
}

/// Test harness around one application state
pub struct Harness {
    pub state: AppState,
    pub fake: Arc<FakeMusicService>,
    pub sessions: Arc<JwtSessionDirectory>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let fake = FakeMusicService::new();
        let sessions = Arc::new(JwtSessionDirectory::new(
            config.session.jwt_secret.clone(),
            config.session.jwt_expiration_hours,
        ));
        let service: Arc<dyn MusicService> = fake.clone();
        let state = AppState::new(&config, service, sessions.clone());

        Self {
            state,
            fake,
            sessions,
        }
    }

    pub fn clerk_token(&self, room: &str) -> String {
        self.sessions
            .issue(&Identity::clerk("clerk-1", room))
            .unwrap()
    }

    pub fn patron_token(&self, patron: &str) -> String {
        self.sessions.issue(&Identity::patron(patron)).unwrap()
    }

    /// A room that completed authorization, optionally with a bound device
    pub async fn authorized_room(&self, room: &str, device: Option<&str>) -> Arc<RoomHandle> {
        let handle = self.state.registry.get_or_create(&RoomId::new(room)).await;
        self.state
            .credentials
            .exchange_authorization_code(&handle, "code")
            .await
            .unwrap();

        if let Some(device) = device {
            self.fake.add_device(device);
            self.state
                .credentials
                .bind_device(&handle, USER_TOKEN)
                .await
                .unwrap();
        }

        self.fake.clear_calls();
        handle
    }

    /// Connect a listener and place it in `room`
    pub async fn listener(&self, room: &str) -> (ConnectionId, UnboundedReceiver<jukebox_server::realtime::ServerEvent>) {
        let connection = ConnectionId::generate();
        let rx = self.state.hub.connect(connection.clone()).await;
        self.state
            .events
            .join(&connection, &RoomId::new(room), None)
            .await;
        (connection, rx)
    }
}

/// Drain every event currently queued on a receiver
pub fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
