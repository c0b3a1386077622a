use crate::room::RoomRegistry;
use crate::signaling::SignalingOutput;
use convene_core::{RoomId, Signal};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Target is not in the sender's room. Membership races make this routine.
    TargetUnknown,
    /// Target is still registered but its connection is already gone.
    SessionGone,
}

/// Forwards handshake messages between participants of the same room.
///
/// Read-only with respect to membership: it only ever borrows the registry.
pub struct SignalRouter {
    signaling: Arc<dyn SignalingOutput>,
}

impl SignalRouter {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self { signaling }
    }

    /// Delivers `signal` verbatim to its target within `room_id`. Nothing is reported
    /// back to the sender; the outcome is only logged.
    pub fn relay(&self, registry: &RoomRegistry, room_id: &RoomId, signal: Signal) -> RelayOutcome {
        let Some(session) = registry.find(room_id, &signal.to) else {
            warn!(
                "Dropping {} from {}: target {} not found in room {}",
                signal.kind, signal.from, signal.to, room_id
            );
            return RelayOutcome::TargetUnknown;
        };

        debug!("Relaying {}: {} -> {}", signal.kind, signal.from, signal.to);

        if self.signaling.deliver(session, signal.into_server_message()) {
            RelayOutcome::Delivered
        } else {
            RelayOutcome::SessionGone
        }
    }
}
