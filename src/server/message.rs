//! Wire records exchanged with clients.

use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// One chat message as it travels over the wire.
///
/// The broker attaches no identity, timestamp, or ordering token of its own.
/// `user` is client-supplied and untrusted. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub user: String,
    pub text: String,
}

impl Message {
    /// Decode one inbound frame.
    ///
    /// Unknown fields are ignored; a frame that is not a JSON object with
    /// non-empty `user` and `text` strings is rejected as a whole. Callers
    /// discard rejected frames without terminating the session.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        let message: Message = serde_json::from_str(frame)?;
        if message.user.is_empty() {
            return Err(DecodeError::EmptyUser);
        }
        if message.text.is_empty() {
            return Err(DecodeError::EmptyText);
        }
        Ok(message)
    }

    /// Encode the message as a single text frame.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Response body of the `/ping` liveness endpoint.
#[derive(Debug, Serialize)]
pub struct Pong {
    pub message: String,
}
