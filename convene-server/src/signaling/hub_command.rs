use convene_core::{ClientMessage, ParticipantId, RoomId, SessionId, Signal, SignalKind};

/// Everything a signaling session can ask of the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `join-room`: declare an identity inside a room.
    Join {
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
    },

    /// `offer`, `answer` or `ice-candidate` addressed to another participant.
    Signal(Signal),

    /// The WebSocket connection closed. The only teardown trigger.
    Disconnect,
}

impl From<ClientMessage> for InboundEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::JoinRoom {
                room_id,
                participant_id,
                display_name,
            } => InboundEvent::Join {
                room_id,
                participant_id,
                display_name,
            },
            ClientMessage::Offer {
                from,
                to,
                session_description,
            } => InboundEvent::Signal(Signal::new(
                SignalKind::Offer,
                from,
                to,
                session_description,
            )),
            ClientMessage::Answer {
                from,
                to,
                session_description,
            } => InboundEvent::Signal(Signal::new(
                SignalKind::Answer,
                from,
                to,
                session_description,
            )),
            ClientMessage::IceCandidate {
                from,
                to,
                candidate,
            } => InboundEvent::Signal(Signal::new(SignalKind::IceCandidate, from, to, candidate)),
        }
    }
}

/// An [`InboundEvent`] tagged with the session it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct HubCommand {
    pub session: SessionId,
    pub event: InboundEvent,
}
