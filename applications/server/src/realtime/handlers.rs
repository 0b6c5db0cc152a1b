//! Inbound room event handlers, independent of the socket transport.
//!
//! No handler fails towards the client: unknown rooms, unauthorized actions
//! and remote failures are logged and answered with a no-op.

use super::events::{ClientEvent, ServerEvent};
use super::hub::RoomHub;
use crate::error::ServerError;
use crate::rooms::{CredentialPhase, RoomHandle, RoomRegistry};
use crate::services::{PlaybackAction, PlayerControl, TrackCatalog};
use jukebox_core::{ConnectionId, RoomId, SessionDirectory, TrackId};
use jukebox_spotify::RemoteServiceError;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RoomEvents {
    registry: Arc<RoomRegistry>,
    sessions: Arc<dyn SessionDirectory>,
    catalog: Arc<TrackCatalog>,
    player: Arc<PlayerControl>,
    hub: Arc<RoomHub>,
}

impl RoomEvents {
    pub fn new(
        registry: Arc<RoomRegistry>,
        sessions: Arc<dyn SessionDirectory>,
        catalog: Arc<TrackCatalog>,
        player: Arc<PlayerControl>,
        hub: Arc<RoomHub>,
    ) -> Self {
        Self {
            registry,
            sessions,
            catalog,
            player,
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<RoomHub> {
        &self.hub
    }

    /// Dispatch one decoded client event
    pub async fn handle(&self, connection: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join { room_id, token } => {
                self.join(connection, &room_id, token.as_deref()).await;
            }
            ClientEvent::Leave { room_id } => self.leave(connection, &room_id).await,
            ClientEvent::Search { room_id, query } => {
                self.search(connection, &room_id, &query).await;
            }
            ClientEvent::EnqueueRequest {
                token,
                room_id,
                track_id,
            } => self.enqueue(token.as_deref(), &room_id, track_id).await,
            ClientEvent::Vote {
                token,
                room_id,
                track_id,
                agree,
            } => self.vote(token.as_deref(), &room_id, track_id, agree).await,
            ClientEvent::PlayPause {
                token,
                room_id,
                action,
            } => self.play_pause(&token, &room_id, action).await,
        }
    }

    /// Join a room, creating it on demand. Replies `joined` and the current
    /// queue to the joining connection.
    pub async fn join(&self, connection: &ConnectionId, room_id: &RoomId, token: Option<&str>) {
        let patron = self.sessions.resolve_patron(token).await;
        info!(connection = %connection, room = %room_id, patron = %patron, "Joining room");

        let handle = self
            .registry
            .join(room_id, connection.clone(), patron)
            .await;
        let needs_authorization = !matches!(
            handle.lock().await.credentials.phase(),
            CredentialPhase::UserAuthorized { device_bound: true }
        );

        self.hub
            .send(
                connection,
                ServerEvent::Joined {
                    room_id: room_id.clone(),
                    needs_authorization,
                },
            )
            .await;

        let snapshot = self.catalog.queue_snapshot(&handle).await;
        self.hub
            .send(connection, ServerEvent::QueueSnapshot(snapshot))
            .await;
    }

    pub async fn leave(&self, connection: &ConnectionId, room_id: &RoomId) {
        if self.registry.room_of(connection).await.as_ref() == Some(room_id) {
            self.registry.leave(connection).await;
        } else {
            debug!(connection = %connection, room = %room_id, "Leave for a room the connection is not in");
        }
    }

    pub async fn search(&self, connection: &ConnectionId, room_id: &RoomId, query: &str) {
        let tracks = self.catalog.search(room_id, query).await;
        self.hub
            .send(
                connection,
                ServerEvent::SearchResults {
                    room_id: room_id.clone(),
                    tracks,
                },
            )
            .await;
    }

    /// Propose a track; an existing proposal counts as an agree vote.
    /// Tracks the catalog does not know are refused.
    pub async fn enqueue(&self, token: Option<&str>, room_id: &RoomId, track_id: TrackId) {
        let Some(handle) = self.registry.get(room_id).await else {
            debug!(room = %room_id, "Enqueue on unknown room ignored");
            return;
        };

        let queued = handle.lock().await.queue.contains(&track_id);
        if !queued {
            if let Err(ServerError::Remote(RemoteServiceError::NotFound(reason))) =
                self.catalog.track(&handle, &track_id).await
            {
                warn!(room = %room_id, track_id = %track_id, reason = %reason, "Enqueue of unknown track refused");
                return;
            }
        }

        let patron = self.sessions.resolve_patron(token).await;
        let outcome = handle.lock().await.queue.add(track_id.clone(), patron.clone());
        debug!(room = %room_id, track_id = %track_id, patron = %patron, outcome = ?outcome, "Enqueue request");

        self.publish_queue(&handle).await;
    }

    pub async fn vote(&self, token: Option<&str>, room_id: &RoomId, track_id: TrackId, agree: bool) {
        let Some(handle) = self.registry.get(room_id).await else {
            debug!(room = %room_id, "Vote on unknown room ignored");
            return;
        };

        let patron = self.sessions.resolve_patron(token).await;
        let recorded = handle.lock().await.queue.vote(&track_id, patron.clone(), agree);

        if recorded {
            debug!(room = %room_id, track_id = %track_id, patron = %patron, agree, "Vote recorded");
            self.publish_queue(&handle).await;
        } else {
            debug!(room = %room_id, track_id = %track_id, patron = %patron, "Vote ignored");
        }
    }

    /// Clerk-only manual play/pause
    pub async fn play_pause(&self, token: &str, room_id: &RoomId, action: PlaybackAction) {
        let controls = self
            .sessions
            .resolve(token)
            .await
            .is_some_and(|identity| identity.controls(room_id));
        if !controls {
            warn!(room = %room_id, "Play/pause rejected: caller does not control this room");
            return;
        }

        let Some(handle) = self.registry.get(room_id).await else {
            debug!(room = %room_id, "Play/pause on unknown room ignored");
            return;
        };

        match self.player.play_pause(&handle, action).await {
            Ok(Some(applied)) => {
                self.hub
                    .broadcast(
                        room_id,
                        ServerEvent::PlayerStateChanged {
                            room_id: room_id.clone(),
                            action: applied,
                        },
                    )
                    .await;
            }
            Ok(None) => {}
            Err(e) => warn!(room = %room_id, action = ?action, error = %e, "Play/pause failed"),
        }
    }

    /// Socket closed: drop membership and the outbound channel
    pub async fn disconnect(&self, connection: &ConnectionId) {
        if let Some(room_id) = self.registry.leave(connection).await {
            debug!(connection = %connection, room = %room_id, "Disconnected");
        }
        self.hub.disconnect(connection).await;
    }

    async fn publish_queue(&self, handle: &RoomHandle) {
        let snapshot = self.catalog.queue_snapshot(handle).await;
        self.hub.publish_queue(snapshot).await;
    }
}
