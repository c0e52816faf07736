//! Integration tests driving the relay end-to-end over loopback sockets.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use roomcast::server::{Message, RoomRegistry, app};
use tokio::time::timeout;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsFrame,
};

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// Serve the relay on an ephemeral loopback port, returning its address and
/// the registry so tests can observe room state.
async fn spawn_server() -> (SocketAddr, Arc<RoomRegistry>) {
    let registry = Arc::new(RoomRegistry::new());
    let app = app(registry.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, registry)
}

async fn connect(addr: SocketAddr, room: &str) -> WsClient {
    let (ws, _response) = connect_async(format!("ws://{}/ws/{}", addr, room))
        .await
        .expect("WebSocket handshake failed");
    ws
}

/// Wait until the room registered under `name` holds `expected` members, so a
/// test never races the server-side join that follows the handshake.
async fn wait_for_members(registry: &RoomRegistry, name: &str, expected: usize) {
    for _ in 0..50 {
        if registry.member_count(name).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room '{}' never reached {} member(s)", name, expected);
}

async fn wait_for_reap(registry: &RoomRegistry, name: &str) {
    for _ in 0..50 {
        if !registry.contains(name).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room '{}' was never reaped", name);
}

async fn send_message(ws: &mut WsClient, user: &str, text: &str) {
    let message = Message {
        user: user.to_string(),
        text: text.to_string(),
    };
    ws.send(WsFrame::Text(serde_json::to_string(&message).unwrap().into()))
        .await
        .expect("failed to send frame");
}

async fn recv_message(ws: &mut WsClient) -> Message {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended while waiting for a frame")
            .expect("transport error while waiting for a frame");
        if let WsFrame::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("received undecodable frame");
        }
    }
}

/// Assert that no text frame arrives within the silence window.
async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(Ok(frame))) = timeout(SILENCE_WINDOW, ws.next()).await {
        if let WsFrame::Text(text) = frame {
            panic!("expected silence, received frame: {}", text);
        }
    }
}

#[tokio::test]
async fn test_ping_endpoint_answers_pong() {
    // given:
    let (addr, _registry) = spawn_server().await;

    // when:
    let body: serde_json::Value = reqwest::get(format!("http://{}/ping", addr))
        .await
        .expect("ping request failed")
        .json()
        .await
        .expect("ping response was not JSON");

    // then:
    assert_eq!(body, serde_json::json!({"message": "pong"}));
}

#[tokio::test]
async fn test_broadcast_reaches_other_member_but_not_sender() {
    // given: alice and bob share a room
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "lobby").await;
    let mut bob = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 2).await;

    // when:
    send_message(&mut alice, "alice", "hi").await;

    // then: bob receives exactly that message, alice hears nothing back
    let received = recv_message(&mut bob).await;
    assert_eq!(received.user, "alice");
    assert_eq!(received.text, "hi");
    assert_silent(&mut bob).await;
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // given: alice and bob in different rooms
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "r1").await;
    let mut bob = connect(addr, "r2").await;
    wait_for_members(&registry, "r1", 1).await;
    wait_for_members(&registry, "r2", 1).await;

    // when:
    send_message(&mut alice, "alice", "anyone here?").await;

    // then:
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_sequential_messages_arrive_in_order() {
    // given:
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "lobby").await;
    let mut bob = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 2).await;

    // when:
    send_message(&mut alice, "alice", "first").await;
    send_message(&mut alice, "alice", "second").await;
    send_message(&mut alice, "alice", "third").await;

    // then:
    assert_eq!(recv_message(&mut bob).await.text, "first");
    assert_eq!(recv_message(&mut bob).await.text, "second");
    assert_eq!(recv_message(&mut bob).await.text, "third");
}

#[tokio::test]
async fn test_malformed_frame_is_discarded_and_session_continues() {
    // given:
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "lobby").await;
    let mut bob = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 2).await;

    // when: garbage, then a valid message on the same session
    alice
        .send(WsFrame::Text("not json".to_string().into()))
        .await
        .expect("failed to send frame");
    send_message(&mut alice, "alice", "still here").await;

    // then: only the valid message comes through
    let received = recv_message(&mut bob).await;
    assert_eq!(received.text, "still here");
    assert_eq!(registry.member_count("lobby").await, 2);
}

#[tokio::test]
async fn test_room_is_reaped_after_last_leave_and_rejoin_is_fresh() {
    // given:
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 1).await;

    // when: alice leaves
    alice.close(None).await.expect("close failed");
    wait_for_reap(&registry, "lobby").await;

    // then: a new join creates a fresh room with no memory of alice
    let mut bob = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 1).await;
    assert_eq!(registry.room_count().await, 1);
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_abrupt_disconnect_also_reaps_the_room() {
    // given:
    let (addr, registry) = spawn_server().await;
    let alice = connect(addr, "lobby").await;
    wait_for_members(&registry, "lobby", 1).await;

    // when: the transport drops without a close handshake
    drop(alice);

    // then:
    wait_for_reap(&registry, "lobby").await;
}

#[tokio::test]
async fn test_empty_room_name_fails_the_handshake() {
    // given:
    let (addr, registry) = spawn_server().await;

    // when: trailing slash, no name
    let result = connect_async(format!("ws://{}/ws/", addr)).await;

    // then: handshake fails and no connection was created
    assert!(result.is_err());
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn test_url_escaped_room_name_is_decoded() {
    // given:
    let (addr, registry) = spawn_server().await;
    let mut alice = connect(addr, "war%20room").await;
    let mut bob = connect(addr, "war%20room").await;
    wait_for_members(&registry, "war room", 2).await;

    // when:
    send_message(&mut alice, "alice", "over here").await;

    // then:
    assert_eq!(recv_message(&mut bob).await.text, "over here");
    assert!(registry.contains("war room").await);
}
