//! Room-based WebSocket chat relay library.
//!
//! Clients join a named room over a WebSocket session and every message they
//! send is fanned out to the other members of that room. Rooms are created on
//! first join and reaped when their last member leaves; nothing is persisted.

pub mod common;
pub mod server;
