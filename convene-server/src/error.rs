use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("malformed signaling frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("signaling hub has stopped")]
    HubStopped,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}
