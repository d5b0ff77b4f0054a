use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::backend::overlay::websocket::websocket_handler;
use crate::backend::overlay::WebSocketState;

/// Bind the overlay server on localhost and serve until the process exits
pub async fn start_overlay_server(
    port: u16,
    overlay_dir: PathBuf,
    ws_state: WebSocketState,
) -> std::io::Result<()> {
    if !overlay_dir.exists() {
        log::warn!(
            "Overlay directory does not exist: {:?}. Creating it...",
            overlay_dir
        );
        std::fs::create_dir_all(&overlay_dir)?;
    }

    let app = create_router(overlay_dir, ws_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Overlay available at http://{}/", addr);

    axum::serve(listener, app).await
}

pub(crate) fn create_router(overlay_dir: PathBuf, ws_state: WebSocketState) -> Router {
    // Browser sources load from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .fallback_service(ServeDir::new(overlay_dir))
        .layer(cors)
        .with_state(ws_state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Overlay server is running")
}
