//! Connection identity, lifecycle, and the bounded outbound queue.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::mpsc;
use uuid::Uuid;

use super::{error::DeliveryError, registry::RoomRegistry, room::Room};

/// How many frames a slow consumer may fall behind before broadcasts are
/// dropped for it.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Opaque handle identifying one live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sending half of a connection's outbound queue.
///
/// Held by the room the connection joined and used during fan-out. Enqueueing
/// never blocks: the queue is bounded and overflow is reported to the caller,
/// which drops the frame for this connection only.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::Sender<String>,
}

impl Outbound {
    /// Non-blocking attempt to place one encoded frame on the queue.
    pub fn enqueue(&self, frame: String) -> Result<(), DeliveryError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Create an outbound queue of the given capacity.
///
/// The `Outbound` half goes to the room for fan-out; the receiver is drained
/// by the connection's write loop.
pub fn outbound_channel(capacity: usize) -> (Outbound, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Outbound { tx }, rx)
}

/// One client's live session, bound to the single room it joined.
pub struct Connection {
    id: ConnectionId,
    room: Arc<Room>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(id: ConnectionId, room: Arc<Room>) -> Self {
        Self {
            id,
            room,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    /// Leave the room and reap it if this was the last member.
    ///
    /// Idempotent: a second close is a no-op, with no duplicate leave side
    /// effect.
    pub async fn close(&self, registry: &RoomRegistry) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.room.leave(self.id).await {
            registry.remove_if_empty(&self.room).await;
        }
        tracing::debug!("Connection '{}' closed", self.id);
    }
}
