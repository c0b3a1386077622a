mod description;
mod participant;
mod room;
mod session;
mod signaling;

pub use description::{IceCandidate, SdpType, SessionDescription};
pub use participant::{ParticipantId, ParticipantSummary};
pub use room::RoomId;
pub use session::SessionId;
pub use signaling::{ClientMessage, ServerMessage, Signal, SignalKind};
