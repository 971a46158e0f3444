//! HTTP surface of the relay: router, CORS policy, and serving loop.

mod dto;
mod error;
mod routes;
mod state;

pub use dto::{ChatPayload, ChatReply, ErrorResponse};
pub use error::ServerError;
pub use routes::chat::MODEL_HEADER;
pub use state::AppState;

use axum::Router;
use axum::http::{HeaderName, Method, header};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/ai-chat", post(routes::chat::ai_chat))
        .route("/chatbot", post(routes::chat::chatbot))
        .layer(cors())
        .with_state(state)
}

/// Browser callers come from the portal's origin; preflights must clear the
/// platform auth headers the frontend attaches to every function call.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<(), ServerError> {
    info!(%addr, "Binding relay server");
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Relay server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
