use crate::signaling::SignalingOutput;
use convene_core::{ServerMessage, SessionId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct SignalingInner {
    sessions: DashMap<SessionId, mpsc::UnboundedSender<ServerMessage>>,
}

/// Table of live signaling sessions and their outbound queues.
///
/// Each WebSocket connection registers an unbounded queue here; its writer task
/// drains the queue onto the socket.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                sessions: DashMap::new(),
            }),
        }
    }

    pub fn add_session(&self, session: SessionId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.inner.sessions.insert(session, tx);
        debug!("Session {} registered ({} live)", session, self.session_count());
    }

    pub fn remove_session(&self, session: &SessionId) {
        self.inner.sessions.remove(session);
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingOutput for SignalingService {
    fn deliver(&self, session: SessionId, message: ServerMessage) -> bool {
        let Some(tx) = self.inner.sessions.get(&session) else {
            warn!("Attempted to send signal to disconnected session {}", session);
            return false;
        };
        if tx.send(message).is_err() {
            warn!("Outbound queue for session {} is closed", session);
            return false;
        }
        true
    }
}
