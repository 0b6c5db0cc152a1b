/// Shared application state
use crate::config::ServerConfig;
use crate::credentials::CredentialManager;
use crate::jobs::{Reconciler, ReconcilerSettings};
use crate::realtime::{RoomEvents, RoomHub};
use crate::rooms::RoomRegistry;
use crate::services::{PlayerControl, TrackCatalog};
use jukebox_core::SessionDirectory;
use jukebox_spotify::MusicService;
use std::sync::Arc;

/// Application state shared across all handlers and the reconciliation loop
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub service: Arc<dyn MusicService>,
    pub sessions: Arc<dyn SessionDirectory>,
    pub credentials: Arc<CredentialManager>,
    pub catalog: Arc<TrackCatalog>,
    pub player: Arc<PlayerControl>,
    pub hub: Arc<RoomHub>,
    pub events: Arc<RoomEvents>,
    pub reconciler: Arc<Reconciler>,
    pub frontend_url: String,
}

impl AppState {
    /// Wire every component around one room registry
    pub fn new(
        config: &ServerConfig,
        service: Arc<dyn MusicService>,
        sessions: Arc<dyn SessionDirectory>,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&service),
            config.playback.token_lifetime(),
        ));
        let catalog = Arc::new(TrackCatalog::new(
            Arc::clone(&service),
            Arc::clone(&credentials),
            Arc::clone(&registry),
            config.catalog.metadata_cache_size,
        ));
        let player = Arc::new(PlayerControl::new(
            Arc::clone(&service),
            Arc::clone(&credentials),
        ));
        let hub = Arc::new(RoomHub::new(Arc::clone(&registry)));
        let events = Arc::new(RoomEvents::new(
            Arc::clone(&registry),
            Arc::clone(&sessions),
            Arc::clone(&catalog),
            Arc::clone(&player),
            Arc::clone(&hub),
        ));
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&registry),
            Arc::clone(&service),
            Arc::clone(&credentials),
            Arc::clone(&player),
            Arc::clone(&catalog),
            Arc::clone(&hub),
            ReconcilerSettings::from(&config.playback),
        ));

        Self {
            registry,
            service,
            sessions,
            credentials,
            catalog,
            player,
            hub,
            events,
            reconciler,
            frontend_url: config.server.frontend_url.trim_end_matches('/').to_string(),
        }
    }
}
