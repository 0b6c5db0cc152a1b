//! Fan-out of server events to connected sockets.

use super::events::ServerEvent;
use crate::rooms::RoomRegistry;
use crate::services::QueueSnapshot;
use jukebox_core::{ConnectionId, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

/// Routes events to connections and rooms.
///
/// Each connection owns an unbounded outbound channel drained by its socket
/// writer, so a slow client never blocks a room's tick.
pub struct RoomHub {
    registry: Arc<RoomRegistry>,
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
    /// Highest queue revision published per room
    published: Mutex<HashMap<RoomId, u64>>,
}

impl RoomHub {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            senders: RwLock::new(HashMap::new()),
            published: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection and return its outbound stream
    pub async fn connect(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.write().await.insert(connection, tx);
        rx
    }

    pub async fn disconnect(&self, connection: &ConnectionId) {
        self.senders.write().await.remove(connection);
    }

    /// Send to one connection; false if it is gone
    pub async fn send(&self, connection: &ConnectionId, event: ServerEvent) -> bool {
        match self.senders.read().await.get(connection) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Send to every member of a room; returns how many received it
    pub async fn broadcast(&self, room_id: &RoomId, event: ServerEvent) -> usize {
        let members = self.registry.members(room_id).await;
        let senders = self.senders.read().await;

        let delivered = members
            .iter()
            .filter_map(|connection| senders.get(connection))
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count();

        debug!(room = %room_id, delivered, "Broadcast event");
        delivered
    }

    /// Broadcast a queue snapshot unless a newer revision already went out.
    ///
    /// The revision check and the sends happen under one lock, so members
    /// always receive snapshots in revision order.
    pub async fn publish_queue(&self, snapshot: QueueSnapshot) -> bool {
        let mut published = self.published.lock().await;
        let last = published.entry(snapshot.room_id.clone()).or_insert(0);
        if snapshot.revision < *last {
            debug!(
                room = %snapshot.room_id,
                revision = snapshot.revision,
                latest = *last,
                "Dropping stale queue snapshot"
            );
            return false;
        }
        *last = snapshot.revision;

        let room_id = snapshot.room_id.clone();
        self.broadcast(&room_id, ServerEvent::QueueSnapshot(snapshot))
            .await;
        drop(published);
        true
    }
}
