//! A named broadcast group of connections.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{
    connection::{ConnectionId, Outbound},
    message::Message,
};

/// Membership set plus the sealed flag set by the registry when it reaps the
/// room. A sealed room rejects joins, so a stale handle obtained before the
/// reap can never resurrect it.
#[derive(Default)]
struct Members {
    senders: HashMap<ConnectionId, Outbound>,
    sealed: bool,
}

/// A named, ephemeral broadcast group.
///
/// Rooms are created by the registry on first join and removed the moment
/// their member count reaches zero. Membership is unordered; all mutation and
/// iteration happens under the room's own lock.
pub struct Room {
    name: String,
    members: Mutex<Members>,
}

impl Room {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Mutex::new(Members::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member. Returns `false` if the room was already sealed, in which
    /// case the caller must resolve a fresh room through the registry.
    ///
    /// No history is sent to the new member; the relay has none.
    pub(crate) async fn join(&self, id: ConnectionId, outbound: Outbound) -> bool {
        let mut members = self.members.lock().await;
        if members.sealed {
            return false;
        }
        members.senders.insert(id, outbound);
        true
    }

    /// Remove a member. Returns whether the room just became empty, in which
    /// case the caller triggers registry cleanup. Removing a member that is
    /// not present is a no-op returning `false`.
    pub(crate) async fn leave(&self, id: ConnectionId) -> bool {
        let mut members = self.members.lock().await;
        members.senders.remove(&id).is_some() && members.senders.is_empty()
    }

    /// Deliver `message` to every member except `sender`.
    ///
    /// Delivery is an independent non-blocking enqueue per recipient: a slow
    /// or disconnected recipient loses this frame but never stalls the
    /// broadcast to the others. Returns the number of members the frame was
    /// handed to.
    pub async fn broadcast(&self, sender: ConnectionId, message: &Message) -> usize {
        let frame = message.encode();
        let members = self.members.lock().await;
        let mut delivered = 0;
        for (id, outbound) in members.senders.iter() {
            if *id == sender {
                continue;
            }
            match outbound.enqueue(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Dropping frame for connection '{}' in room '{}': {}",
                        id,
                        self.name,
                        e
                    );
                }
            }
        }
        delivered
    }

    pub async fn member_count(&self) -> usize {
        self.members.lock().await.senders.len()
    }

    /// Seal the room iff it has no members, so that no late joiner sneaks in
    /// between the emptiness check and the registry removing the entry.
    /// Only the registry calls this, while holding its own lock.
    pub(crate) async fn seal_if_empty(&self) -> bool {
        let mut members = self.members.lock().await;
        if members.senders.is_empty() {
            members.sealed = true;
            true
        } else {
            false
        }
    }
}
