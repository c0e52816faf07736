//! Process-wide room registry.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use super::{
    connection::{ConnectionId, Outbound},
    room::Room,
};

/// Mapping from room name to live room, for the lifetime of the process.
///
/// Rooms are created lazily on first join and removed the moment their last
/// member leaves, so the map never grows with abandoned names. The registry
/// is constructed explicitly and handed to the router as shared state; tests
/// build their own instance.
///
/// Lock discipline: where both locks are needed the registry lock is taken
/// first, then the room lock. Rooms never take the registry lock.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Return the room registered under `name`, creating and inserting an
    /// empty one if absent. Concurrent calls with the same name observe a
    /// single room. `name` is accepted verbatim; validation happens at the
    /// accept boundary.
    pub async fn get_or_create(&self, name: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(name) {
            return room.clone();
        }
        let room = Arc::new(Room::new(name));
        rooms.insert(name.to_string(), room.clone());
        tracing::debug!("Room '{}' created", name);
        room
    }

    /// Resolve the room for `name` and add the member to it.
    ///
    /// Retries when the resolved room was reaped between lookup and join (the
    /// reaper seals a room before dropping it from the map), so a concurrent
    /// removal can never strand a joining member in an unregistered room.
    pub async fn join(&self, name: &str, id: ConnectionId, outbound: Outbound) -> Arc<Room> {
        loop {
            let room = self.get_or_create(name).await;
            if room.join(id, outbound.clone()).await {
                return room;
            }
        }
    }

    /// Remove `room` from the registry iff its member count is zero.
    ///
    /// The emptiness check runs under the registry lock, and an empty room is
    /// sealed before its entry is dropped; a join racing with the removal
    /// either lands before the check (the room survives) or is rejected by
    /// the seal and resolves a fresh room. The entry is only removed when it
    /// still refers to this exact room, so a fresh same-name room created in
    /// the meantime is never torn down.
    pub async fn remove_if_empty(&self, room: &Arc<Room>) {
        let mut rooms = self.rooms.lock().await;
        if !room.seal_if_empty().await {
            return;
        }
        if let Some(current) = rooms.get(room.name()) {
            if Arc::ptr_eq(current, room) {
                rooms.remove(room.name());
                tracing::debug!("Room '{}' is empty, removed", room.name());
            }
        }
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.rooms.lock().await.contains_key(name)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Member count of the room registered under `name`, zero if absent.
    pub async fn member_count(&self, name: &str) -> usize {
        let room = { self.rooms.lock().await.get(name).cloned() };
        match room {
            Some(room) => room.member_count().await,
            None => 0,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
