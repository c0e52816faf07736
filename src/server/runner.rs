//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{
    handler::{ping, websocket_handler},
    registry::RoomRegistry,
    signal::shutdown_signal,
};

/// Build the relay router on top of an explicit registry.
///
/// The registry is injected rather than created here so tests can observe
/// and reset it.
pub fn app(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/ws/{room}", get(websocket_handler))
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Run the chat relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(RoomRegistry::new());
    let app = app(registry);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Chat relay listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws/{{room}}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // Set up graceful shutdown signal handler
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
