use crate::error::SignalingError;
use crate::room::{Participant, RoomRegistry};
use crate::signaling::{HubCommand, InboundEvent, RelayOutcome, SignalRouter, SignalingOutput};
use convene_core::{ParticipantId, RoomId, ServerMessage, SessionId, Signal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const HUB_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    room_id: RoomId,
    participant_id: ParticipantId,
}

/// Single owner of all signaling state.
///
/// Commands from every connection funnel into one task and are applied one at a
/// time, so membership changes never interleave.
pub struct SignalingHub {
    signaling: Arc<dyn SignalingOutput>,
    registry: RoomRegistry,
    router: SignalRouter,
    bindings: HashMap<SessionId, Binding>,
}

impl SignalingHub {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry: RoomRegistry::new(signaling.clone()),
            router: SignalRouter::new(signaling.clone()),
            signaling,
            bindings: HashMap::new(),
        }
    }

    /// Starts the hub on the current runtime and returns the handle connections use to
    /// reach it. The hub stops once every handle is dropped.
    pub fn spawn(signaling: Arc<dyn SignalingOutput>) -> HubHandle {
        let (command_tx, command_rx) = mpsc::channel(HUB_CHANNEL_CAPACITY);
        let hub = Self::new(signaling);
        tokio::spawn(hub.run(command_rx));
        HubHandle { command_tx }
    }

    pub async fn run(mut self, mut command_rx: mpsc::Receiver<HubCommand>) {
        info!("Signaling hub started");

        while let Some(command) = command_rx.recv().await {
            self.handle(command);
        }

        info!("Signaling hub finished");
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn handle(&mut self, command: HubCommand) {
        let HubCommand { session, event } = command;
        match event {
            InboundEvent::Join {
                room_id,
                participant_id,
                display_name,
            } => self.handle_join(session, room_id, participant_id, display_name),
            InboundEvent::Signal(signal) => self.handle_signal(session, signal),
            InboundEvent::Disconnect => self.handle_disconnect(session),
        }
    }

    fn handle_join(
        &mut self,
        session: SessionId,
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
    ) {
        let binding = Binding {
            room_id,
            participant_id,
        };

        if let Some(previous) = self.bindings.remove(&session) {
            if previous != binding {
                info!(
                    "Session {} rejoins as {} in {}; leaving {} in {}",
                    session,
                    binding.participant_id,
                    binding.room_id,
                    previous.participant_id,
                    previous.room_id
                );
                self.release(session, &previous);
            }
        }

        let participant = Participant::new(binding.participant_id.clone(), display_name, session);
        let existing = self.registry.join(binding.room_id.clone(), participant);
        self.bindings.insert(session, binding);

        self.signaling
            .deliver(session, ServerMessage::ExistingUsers { users: existing });
    }

    fn handle_signal(&self, session: SessionId, mut signal: Signal) {
        let Some(binding) = self.bindings.get(&session) else {
            warn!("Dropping {} from session {} that never joined", signal.kind, session);
            return;
        };

        if !self.owns_entry(session, binding) {
            warn!(
                "Dropping {} from session {}: identity {} was taken over",
                signal.kind, session, binding.participant_id
            );
            return;
        }

        if signal.from != binding.participant_id {
            warn!(
                "Session {} declared sender {} but joined as {}",
                session, signal.from, binding.participant_id
            );
            signal.from = binding.participant_id.clone();
        }

        let outcome = self.router.relay(&self.registry, &binding.room_id, signal);
        if outcome != RelayOutcome::Delivered {
            debug!("Relay from session {} ended as {:?}", session, outcome);
        }
    }

    fn handle_disconnect(&mut self, session: SessionId) {
        let Some(binding) = self.bindings.remove(&session) else {
            debug!("Session {} closed without joining", session);
            return;
        };
        info!(
            "Session {} closed; {} leaves {}",
            session, binding.participant_id, binding.room_id
        );
        self.release(session, &binding);
    }

    /// Leaves the registry entry behind `binding`, unless another session has since
    /// claimed the same identity.
    fn release(&mut self, session: SessionId, binding: &Binding) {
        if self.owns_entry(session, binding) {
            self.registry
                .leave(&binding.room_id, &binding.participant_id);
        } else {
            debug!(
                "Not removing {} from {}: owned by another session",
                binding.participant_id, binding.room_id
            );
        }
    }

    fn owns_entry(&self, session: SessionId, binding: &Binding) -> bool {
        self.registry
            .find(&binding.room_id, &binding.participant_id)
            == Some(session)
    }
}

/// Cloneable sender side of a running [`SignalingHub`].
#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub fn new(command_tx: mpsc::Sender<HubCommand>) -> Self {
        Self { command_tx }
    }

    pub async fn dispatch(
        &self,
        session: SessionId,
        event: InboundEvent,
    ) -> Result<(), SignalingError> {
        self.command_tx
            .send(HubCommand { session, event })
            .await
            .map_err(|_| SignalingError::HubStopped)
    }
}
