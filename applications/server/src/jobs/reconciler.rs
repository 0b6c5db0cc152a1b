/// Playback Reconciliation Loop
///
/// A single scheduler ticks on a fixed interval and spawns one task per room,
/// so a slow music service call for one room never delays another.
use crate::config::PlaybackSettings;
use crate::credentials::CredentialManager;
use crate::error::ServerError;
use crate::realtime::{RoomHub, ServerEvent};
use crate::rooms::{RoomHandle, RoomRegistry};
use crate::services::{PlayerCommand, PlayerControl, TrackCatalog};
use jukebox_spotify::{MusicService, RemoteErrorKind, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy)]
pub struct ReconcilerSettings {
    pub tick_interval: Duration,
    pub prestage_threshold_ms: u64,
    pub commit_threshold_ms: u64,
}

impl From<&PlaybackSettings> for ReconcilerSettings {
    fn from(settings: &PlaybackSettings) -> Self {
        Self {
            tick_interval: settings.tick_interval(),
            prestage_threshold_ms: settings.prestage_threshold_ms,
            commit_threshold_ms: settings.commit_threshold_ms,
        }
    }
}

pub struct Reconciler {
    registry: Arc<RoomRegistry>,
    service: Arc<dyn MusicService>,
    credentials: Arc<CredentialManager>,
    player: Arc<PlayerControl>,
    catalog: Arc<TrackCatalog>,
    hub: Arc<RoomHub>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        registry: Arc<RoomRegistry>,
        service: Arc<dyn MusicService>,
        credentials: Arc<CredentialManager>,
        player: Arc<PlayerControl>,
        catalog: Arc<TrackCatalog>,
        hub: Arc<RoomHub>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            registry,
            service,
            credentials,
            player,
            catalog,
            hub,
            settings,
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Start the scheduler task
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.settings.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                "Reconciliation loop started (every {:?})",
                self.settings.tick_interval
            );

            loop {
                interval.tick().await;
                self.spawn_ticks().await;
            }
        })
    }

    /// Spawn one tick per room, skipping rooms whose previous tick is still
    /// running.
    pub async fn spawn_ticks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let handles = self.registry.handles().await;
        let mut tasks = Vec::with_capacity(handles.len());

        for handle in handles {
            let Some(guard) = handle.try_begin_tick() else {
                tracing::debug!(room = %handle.id(), "Previous tick still running, skipping");
                continue;
            };

            let reconciler = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                let _guard = guard;
                reconciler.tick_room(&handle).await;
            }));
        }

        tasks
    }

    /// One reconciliation pass over a room. Never fails: every remote error
    /// is logged and left for the next tick.
    pub async fn tick_room(&self, handle: &RoomHandle) {
        let (phase, paused, user_token) = {
            let room = handle.lock().await;
            (
                room.credentials.phase(),
                room.paused,
                room.credentials.user_token().map(str::to_owned),
            )
        };

        let mut current = None;
        if let (true, false, Some(token)) = (phase.is_user_authorized(), paused, user_token.as_deref()) {
            current = self.reconcile_player(handle, token).await;
        }

        self.publish(handle, current).await;

        if phase.is_user_authorized() {
            self.count_down(handle).await;
        }
    }

    /// Step 1: drive the player from its reported state. Returns the track
    /// now playing, if known.
    async fn reconcile_player(&self, handle: &RoomHandle, token: &str) -> Option<Track> {
        let state = match self.service.playback_state(token).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(room = %handle.id(), error = %e, "Failed to fetch playback state");
                return None;
            }
        };

        match state {
            Some(state) if state.is_playing => {
                let Some(remaining) = state.remaining_ms() else {
                    tracing::debug!(room = %handle.id(), "Player busy without a track");
                    return None;
                };
                self.advance(handle, token, remaining).await;
                state.item
            }
            _ => self.start_front(handle, token).await,
        }
    }

    /// Nothing playing: start the queue front, removing it once playing or
    /// once the service refuses it.
    async fn start_front(&self, handle: &RoomHandle, token: &str) -> Option<Track> {
        let front = handle
            .lock()
            .await
            .queue
            .peek_front()
            .map(|entry| entry.track_id().clone());

        let Some(track_id) = front else {
            tracing::debug!(room = %handle.id(), "Player idle and queue empty");
            return None;
        };

        let result = self
            .player
            .send(handle, token, &PlayerCommand::Play(track_id.clone()))
            .await;

        if let Err(e) = &result {
            if is_retryable(e) {
                tracing::warn!(room = %handle.id(), track_id = %track_id, error = %e, "Failed to start track, retrying next tick");
                return None;
            }
            tracing::warn!(room = %handle.id(), track_id = %track_id, error = %e, "Dropping track the player refused");
        }

        {
            let mut room = handle.lock().await;
            room.queue.remove(&track_id);
            if room.staged.as_ref() == Some(&track_id) {
                room.staged = None;
            }
        }

        if result.is_err() {
            return None;
        }
        tracing::info!(room = %handle.id(), track_id = %track_id, "Started track");

        self.catalog.track(handle, &track_id).await.ok()
    }

    /// Something playing: stage inside the window, commit at the threshold.
    async fn advance(&self, handle: &RoomHandle, token: &str, remaining_ms: u64) {
        if remaining_ms <= self.settings.commit_threshold_ms {
            let staged = handle.lock().await.staged.take();
            let Some(track_id) = staged else {
                return;
            };

            match self
                .player
                .send(handle, token, &PlayerCommand::Enqueue(track_id.clone()))
                .await
            {
                Ok(()) => {
                    handle.lock().await.queue.remove(&track_id);
                    tracing::info!(room = %handle.id(), track_id = %track_id, "Committed next track");
                }
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(room = %handle.id(), track_id = %track_id, error = %e, "Failed to commit next track");
                }
                Err(e) => {
                    handle.lock().await.queue.remove(&track_id);
                    tracing::warn!(room = %handle.id(), track_id = %track_id, error = %e, "Dropping track the player refused");
                }
            }
        } else if remaining_ms <= self.settings.prestage_threshold_ms {
            let mut room = handle.lock().await;
            if room.staged.is_some() {
                return;
            }

            let selection = room.queue.select_next();
            for entry in &selection.discarded {
                tracing::info!(
                    room = %handle.id(),
                    track_id = %entry.track_id(),
                    agree = entry.agree_count(),
                    disagree = entry.disagree_count(),
                    "Discarded rejected track"
                );
            }
            if let Some(next) = &selection.next {
                tracing::debug!(room = %handle.id(), track_id = %next, "Staged next track");
            }
            room.staged = selection.next;
        }
    }

    /// Step 2: current track (when known) and queue to every member.
    async fn publish(&self, handle: &RoomHandle, current: Option<Track>) {
        if let Some(track) = current {
            self.hub
                .broadcast(
                    handle.id(),
                    ServerEvent::CurrentTrack {
                        room_id: handle.id().clone(),
                        track,
                    },
                )
                .await;
        }

        let snapshot = self.catalog.queue_snapshot(handle).await;
        self.hub.publish_queue(snapshot).await;
    }

    /// Step 3: token validity countdown, refreshing once per tick when due.
    async fn count_down(&self, handle: &RoomHandle) {
        let due = {
            let mut room = handle.lock().await;
            let credentials = &mut room.credentials;
            credentials.validity_remaining_ms -= self.settings.tick_interval.as_millis() as i64;
            credentials.validity_remaining_ms <= 0
        };

        if due {
            if let Err(e) = self.credentials.refresh(handle).await {
                tracing::warn!(room = %handle.id(), error = %e, "Token refresh failed, retrying next tick");
            }
        }
    }
}

/// Failures that can clear up by a later tick: no usable device, an expired
/// token or rate limiting. Anything else means the service refuses the track.
fn is_retryable(error: &ServerError) -> bool {
    match error {
        ServerError::DeviceNotBound(_) | ServerError::Credential(_) => true,
        ServerError::Remote(e) => matches!(
            e.kind(),
            RemoteErrorKind::DeviceUnavailable
                | RemoteErrorKind::RateLimited
                | RemoteErrorKind::Unauthorized
        ),
        _ => false,
    }
}
