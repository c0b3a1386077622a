use convene_core::{ServerMessage, SessionId};

/// Outbound side of the signaling transport, as seen by the registry and the router.
///
/// Delivery is fire-and-forget and must not block: registry operations call it while
/// mutating membership.
pub trait SignalingOutput: Send + Sync {
    /// Queues `message` for `session`. Returns `false` when the session is no longer
    /// connected.
    fn deliver(&self, session: SessionId, message: ServerMessage) -> bool;
}

/// Captures every delivery, for unit tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingOutput {
    sent: std::sync::Mutex<Vec<(SessionId, ServerMessage)>>,
    closed: std::sync::Mutex<Vec<SessionId>>,
}

#[cfg(test)]
impl RecordingOutput {
    pub(crate) fn take(&self) -> Vec<(SessionId, ServerMessage)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub(crate) fn close_session(&self, session: SessionId) {
        self.closed.lock().unwrap().push(session);
    }
}

#[cfg(test)]
impl SignalingOutput for RecordingOutput {
    fn deliver(&self, session: SessionId, message: ServerMessage) -> bool {
        if self.closed.lock().unwrap().contains(&session) {
            return false;
        }
        self.sent.lock().unwrap().push((session, message));
        true
    }
}
