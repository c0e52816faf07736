//! WebSocket chat relay implementation.

mod connection;
mod error;
mod handler;
mod message;
mod registry;
mod room;
mod runner;
mod signal;

pub use connection::{Connection, ConnectionId, OUTBOUND_QUEUE_CAPACITY, Outbound, outbound_channel};
pub use error::{DecodeError, DeliveryError, InvalidRoomError};
pub use message::{Message, Pong};
pub use registry::RoomRegistry;
pub use room::Room;
pub use runner::{app, run_server};
