//! Error types for the chat relay.
//!
//! Every failure here is session-scoped. Nothing in this taxonomy terminates
//! the process, and no failure of one connection is allowed to affect any
//! other connection or the integrity of a room or the registry.

use thiserror::Error;

/// The room identifier was missing or empty at accept time.
///
/// The session is rejected before a connection is created, surfaced to the
/// client as a failed handshake.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing or empty room name")]
pub struct InvalidRoomError;

/// An inbound frame could not be decoded as a chat message.
///
/// Recovered locally: the frame is discarded and the session continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not a JSON object matching the message schema
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `user` field is missing or empty
    #[error("missing or empty 'user' field")]
    EmptyUser,

    /// `text` field is missing or empty
    #[error("missing or empty 'text' field")]
    EmptyText,
}

/// A broadcast frame could not be handed to one recipient.
///
/// Recovered locally: logged at most, never surfaced to the sender or to
/// other recipients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// Recipient's outbound queue is full (slow consumer)
    #[error("outbound queue is full")]
    QueueFull,

    /// Recipient's write loop is gone
    #[error("outbound queue is closed")]
    Closed,
}
