use crate::model::participant::{ParticipantId, ParticipantSummary};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Frames a participant sends to the signaling server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: String,
    },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        session_description: Value,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        session_description: Value,
    },
    IceCandidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: Value,
    },
}

/// Frames the signaling server pushes to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Everyone already in the room, in join order. Sent to the joiner only.
    ExistingUsers { users: Vec<ParticipantSummary> },
    UserConnected {
        participant_id: ParticipantId,
        display_name: String,
    },
    UserDisconnected { participant_id: ParticipantId },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        session_description: Value,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        session_description: Value,
    },
    IceCandidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        };
        f.write_str(name)
    }
}

/// A point-to-point handshake message. The payload is never interpreted in transit.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub payload: Value,
}

impl Signal {
    pub fn new(kind: SignalKind, from: ParticipantId, to: ParticipantId, payload: Value) -> Self {
        Self {
            kind,
            from,
            to,
            payload,
        }
    }

    pub fn into_server_message(self) -> ServerMessage {
        let Signal {
            kind,
            from,
            to,
            payload,
        } = self;
        match kind {
            SignalKind::Offer => ServerMessage::Offer {
                from,
                to,
                session_description: payload,
            },
            SignalKind::Answer => ServerMessage::Answer {
                from,
                to,
                session_description: payload,
            },
            SignalKind::IceCandidate => ServerMessage::IceCandidate {
                from,
                to,
                candidate: payload,
            },
        }
    }
}
