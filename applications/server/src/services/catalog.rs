/// Track catalog: search, metadata lookups and queue snapshots
use crate::credentials::CredentialManager;
use crate::error::{Result, ServerError};
use crate::rooms::{RoomHandle, RoomRegistry};
use futures_util::stream::{self, StreamExt};
use jukebox_core::{RoomId, TrackId};
use jukebox_queue::VoteTally;
use jukebox_spotify::{MusicService, RemoteServiceError, Track};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Metadata lookups in flight per snapshot
const SNAPSHOT_CONCURRENCY: usize = 4;

/// One queue entry as published to room members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub track: Track,
    pub agree: usize,
    pub disagree: usize,
}

/// The outward view of a room's queue at one revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub room_id: RoomId,
    pub revision: u64,
    pub entries: Vec<SnapshotEntry>,
}

pub struct TrackCatalog {
    service: Arc<dyn MusicService>,
    credentials: Arc<CredentialManager>,
    registry: Arc<RoomRegistry>,
    cache: Mutex<LruCache<TrackId, Track>>,
}

impl TrackCatalog {
    pub fn new(
        service: Arc<dyn MusicService>,
        credentials: Arc<CredentialManager>,
        registry: Arc<RoomRegistry>,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);

        Self {
            service,
            credentials,
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Search tracks for a room.
    ///
    /// `None` for an empty query; an empty list for unknown rooms and on any
    /// failure.
    pub async fn search(&self, room_id: &RoomId, query: &str) -> Option<Vec<Track>> {
        if query.trim().is_empty() {
            return None;
        }

        let Some(handle) = self.registry.get(room_id).await else {
            debug!(room = %room_id, "Search on unknown room");
            return Some(Vec::new());
        };

        let result = self
            .with_catalog_token(&handle, |token| {
                let service = Arc::clone(&self.service);
                let query = query.to_string();
                async move { service.search_tracks(&token, &query).await }
            })
            .await;

        match result {
            Ok(tracks) => Some(tracks),
            Err(e) => {
                warn!(room = %room_id, query = %query, error = %e, "Search failed");
                Some(Vec::new())
            }
        }
    }

    /// Metadata for one track, served from cache when possible
    pub async fn track(&self, handle: &RoomHandle, track_id: &TrackId) -> Result<Track> {
        if let Some(track) = self.cached(track_id) {
            return Ok(track);
        }

        let track = self
            .with_catalog_token(handle, |token| {
                let service = Arc::clone(&self.service);
                let track_id = track_id.clone();
                async move { service.get_track(&token, &track_id).await }
            })
            .await?;

        self.lock_cache().put(track_id.clone(), track.clone());
        Ok(track)
    }

    /// Current queue of a room enriched with display metadata.
    ///
    /// Tallies and revision are read under one room lock, so the snapshot
    /// reflects every mutation completed before it. Entries whose metadata
    /// cannot be fetched are omitted.
    pub async fn queue_snapshot(&self, handle: &RoomHandle) -> QueueSnapshot {
        let (revision, tallies) = {
            let room = handle.lock().await;
            (room.queue.revision(), room.queue.tallies().collect::<Vec<_>>())
        };

        let entries: Vec<SnapshotEntry> = stream::iter(tallies)
            .map(|tally| self.enrich(handle, tally))
            .buffered(SNAPSHOT_CONCURRENCY)
            .filter_map(|entry| async move { entry })
            .collect()
            .await;

        QueueSnapshot {
            room_id: handle.id().clone(),
            revision,
            entries,
        }
    }

    async fn enrich(&self, handle: &RoomHandle, tally: VoteTally) -> Option<SnapshotEntry> {
        match self.track(handle, &tally.track_id).await {
            Ok(track) => Some(SnapshotEntry {
                track,
                agree: tally.agree,
                disagree: tally.disagree,
            }),
            Err(e) => {
                warn!(room = %handle.id(), track_id = %tally.track_id, error = %e, "Omitting track from snapshot");
                None
            }
        }
    }

    /// Run a catalog call with the room's token, re-exchanging a rejected
    /// client token once.
    async fn with_catalog_token<T, F, Fut>(&self, handle: &RoomHandle, call: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = jukebox_spotify::Result<T>>,
    {
        let token = self.credentials.ensure_client_token(handle).await?;

        match call(token.clone()).await {
            Err(RemoteServiceError::Unauthorized(msg)) => {
                debug!(room = %handle.id(), reason = %msg, "Catalog token rejected, re-authenticating");
                self.credentials.invalidate_client_token(handle, &token).await;
                let token = self.credentials.ensure_client_token(handle).await?;
                call(token).await.map_err(ServerError::from)
            }
            other => other.map_err(ServerError::from),
        }
    }

    fn cached(&self, track_id: &TrackId) -> Option<Track> {
        self.lock_cache().get(track_id).cloned()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<TrackId, Track>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
