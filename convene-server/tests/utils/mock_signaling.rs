use convene_core::{ServerMessage, SessionId};
use convene_server::SignalingOutput;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<(SessionId, ServerMessage)>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<(SessionId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SessionId, ServerMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// All messages delivered to `session`, in delivery order.
    pub fn delivered_to(&self, session: SessionId) -> Vec<ServerMessage> {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == session)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn deliver(&self, session: SessionId, message: ServerMessage) -> bool {
        tracing::debug!("[MockSignaling] deliver to {}", session);

        self.signals
            .lock()
            .unwrap()
            .push((session, message.clone()));
        let _ = self.tx.send((session, message));
        true
    }
}
