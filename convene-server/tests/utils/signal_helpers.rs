use anyhow::{Context, Result};
use convene_core::{ServerMessage, SessionId};
use convene_server::{ServerConfig, serve_on};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Timeout for a single signaling message (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long to listen before concluding nothing was sent (ms).
pub const SILENCE_TIMEOUT_MS: u64 = 200;

/// Start a signaling server on an ephemeral port and return its address.
pub async fn spawn_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;

    let config = ServerConfig {
        host: addr.ip(),
        port: addr.port(),
        ..ServerConfig::default()
    };

    tokio::spawn(async move {
        if let Err(e) = serve_on(listener, config).await {
            tracing::error!("[TestServer] stopped: {}", e);
        }
    });

    Ok(addr)
}

/// Wait for the next message delivered through a mock output to `session`.
pub async fn wait_for_delivery(
    rx: &mut mpsc::UnboundedReceiver<(SessionId, ServerMessage)>,
    session: SessionId,
    timeout_ms: u64,
) -> Result<ServerMessage> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);

    loop {
        let (target, message) = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .with_context(|| format!("Timeout waiting for delivery to {session}"))?
            .context("Signaling channel closed")?;

        if target == session {
            return Ok(message);
        }
        tracing::debug!("[SignalHelper] skipping delivery to {}", target);
    }
}
