//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};

use super::{
    connection::{Connection, ConnectionId, OUTBOUND_QUEUE_CAPACITY, outbound_channel},
    error::InvalidRoomError,
    message::{Message, Pong},
    registry::RoomRegistry,
};

/// The room name is the URL-decoded path segment, accepted verbatim apart
/// from the one rule that it must not be empty.
fn room_name(raw: &str) -> Result<&str, InvalidRoomError> {
    if raw.is_empty() {
        return Err(InvalidRoomError);
    }
    Ok(raw)
}

/// Accept one session: resolve the room name, then upgrade the transport and
/// hand the socket to [`handle_socket`]. A missing or empty room name rejects
/// the session as a failed handshake, before any connection exists.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<RoomRegistry>>,
    Path(room): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    if let Err(e) = room_name(&room) {
        tracing::warn!("Rejecting session: {}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, registry, room)))
}

/// Run one session: join the room, pump the read and write loops until the
/// transport closes, then leave.
async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>, room_name: String) {
    let id = ConnectionId::new();
    let (outbound, mut rx) = outbound_channel(OUTBOUND_QUEUE_CAPACITY);
    let room = registry.join(&room_name, id, outbound).await;
    let connection = Connection::new(id, room.clone());
    tracing::info!("Connection '{}' joined room '{}'", id, room_name);

    let (mut sender, mut receiver) = socket.split();

    // Read loop: decode each inbound frame and hand it to the room. A frame
    // that fails to decode is discarded; the session continues.
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!("Transport error on connection '{}': {}", id, e);
                    break;
                }
            };

            match frame {
                WsFrame::Text(text) => match Message::decode(&text) {
                    Ok(message) => {
                        let delivered = room.broadcast(id, &message).await;
                        tracing::debug!(
                            "Relayed message from '{}' in room '{}' to {} member(s)",
                            message.user,
                            room.name(),
                            delivered
                        );
                    }
                    Err(e) => {
                        tracing::debug!("Discarding frame on connection '{}': {}", id, e);
                    }
                },
                WsFrame::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", id);
                    break;
                }
                // Ping/pong is handled by the protocol layer; binary frames
                // are not part of the wire format.
                _ => {}
            }
        }
    });

    // Write loop: drain the outbound queue into the socket, in queue order.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(WsFrame::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Whichever loop ends first, tear down the other so close is prompt.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    connection.close(&registry).await;
    tracing::info!("Connection '{}' left room '{}'", id, room_name);
}

/// Liveness endpoint.
pub async fn ping() -> Json<Pong> {
    Json(Pong {
        message: "pong".to_string(),
    })
}
