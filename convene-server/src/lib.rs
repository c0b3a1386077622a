mod config;
mod error;
mod http;
mod room;
mod signaling;

pub use config::*;
pub use error::*;
pub use http::*;
pub use room::*;
pub use signaling::*;

use tokio::net::TcpListener;
use tracing::info;

/// Binds `config.addr()` and serves signaling plus the HTTP surface until the process
/// is stopped.
pub async fn serve(config: ServerConfig) -> Result<(), SignalingError> {
    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| SignalingError::Bind { addr, source })?;

    info!("Signaling server listening on http://{}", addr);
    serve_on(listener, config).await
}

/// Serves on an already bound listener.
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<(), SignalingError> {
    let app = router(AppState::start(), &config.public_dir);
    axum::serve(listener, app)
        .await
        .map_err(SignalingError::Serve)
}
