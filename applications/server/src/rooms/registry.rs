//! Registry of active rooms and connection membership.

use super::room::Room;
use jukebox_core::{ConnectionId, PatronId, RoomId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// One room behind its own lock.
///
/// Rooms never share a lock: holding one handle's guard never blocks work on
/// another room. Guards must not be held across calls to the music service.
#[derive(Debug)]
pub struct RoomHandle {
    id: RoomId,
    room: Mutex<Room>,
    ticking: AtomicBool,
}

impl RoomHandle {
    fn new(id: RoomId) -> Self {
        Self {
            room: Mutex::new(Room::new(id.clone())),
            id,
            ticking: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().await
    }

    /// Claim this room for one reconciliation tick.
    ///
    /// Returns `None` while a previous tick is still in flight.
    pub fn try_begin_tick(self: &Arc<Self>) -> Option<TickGuard> {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard {
                handle: Arc::clone(self),
            })
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }
}

/// Releases the room's tick claim when dropped
#[derive(Debug)]
pub struct TickGuard {
    handle: Arc<RoomHandle>,
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.handle.ticking.store(false, Ordering::Release);
    }
}

/// Owns every room, keyed by venue id.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<RoomHandle>>>,
    connections: RwLock<HashMap<ConnectionId, RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, room_id: &RoomId) -> Option<Arc<RoomHandle>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn get_or_create(&self, room_id: &RoomId) -> Arc<RoomHandle> {
        if let Some(handle) = self.get(room_id).await {
            return handle;
        }

        let mut rooms = self.rooms.write().await;
        Arc::clone(rooms.entry(room_id.clone()).or_insert_with(|| {
            info!(room = %room_id, "Creating room");
            Arc::new(RoomHandle::new(room_id.clone()))
        }))
    }

    /// Register `connection` as `patron` in `room_id`, creating the room on
    /// demand. A connection already in another room is moved.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection: ConnectionId,
        patron: PatronId,
    ) -> Arc<RoomHandle> {
        let handle = self.get_or_create(room_id).await;

        let previous = self
            .connections
            .write()
            .await
            .insert(connection.clone(), room_id.clone());

        if let Some(previous) = previous.filter(|previous| previous != room_id) {
            if let Some(old) = self.get(&previous).await {
                old.lock().await.remove_member(&connection);
                debug!(connection = %connection, from = %previous, to = %room_id, "Connection moved rooms");
            }
        }

        handle.lock().await.insert_member(connection, patron);
        handle
    }

    /// Remove `connection` from whichever room holds it
    pub async fn leave(&self, connection: &ConnectionId) -> Option<RoomId> {
        let room_id = self.connections.write().await.remove(connection)?;

        if let Some(handle) = self.get(&room_id).await {
            handle.lock().await.remove_member(connection);
        }

        debug!(connection = %connection, room = %room_id, "Connection left room");
        Some(room_id)
    }

    pub async fn room_of(&self, connection: &ConnectionId) -> Option<RoomId> {
        self.connections.read().await.get(connection).cloned()
    }

    /// Connections currently in `room_id`
    pub async fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        match self.get(room_id).await {
            Some(handle) => handle
                .lock()
                .await
                .members()
                .map(|(connection, _)| connection.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Snapshot of all room handles
    pub async fn handles(&self) -> Vec<Arc<RoomHandle>> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
