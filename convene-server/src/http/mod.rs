mod pages;

use crate::signaling::{HubHandle, SignalingHub, SignalingService, ws_handler};
use axum::Router;
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub hub: HubHandle,
}

impl AppState {
    /// Creates the session table and starts a hub that delivers through it.
    pub fn start() -> Self {
        let signaling = SignalingService::new();
        let hub = SignalingHub::spawn(Arc::new(signaling.clone()));
        Self { signaling, hub }
    }
}

/// HTTP surface: landing page, room shell, the signaling socket and static assets.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(pages::landing))
        .route("/room/{room_id}", get(pages::room))
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
