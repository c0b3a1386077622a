use crate::media::{LocalTrack, TrackKind};
use anyhow::Result;
use async_trait::async_trait;
use convene_core::{IceCandidate, ParticipantId, SessionDescription};
use tokio::sync::mpsc;

/// Identifies one link instance. A replaced link keeps the remote id but gets a new
/// generation, so late events from its predecessor can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkTag {
    pub remote: ParticipantId,
    pub generation: u64,
}

/// Connectivity as reported by the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Events a peer connection emits on its own schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    TransportState(TransportState),
    RemoteTrack(RemoteTrack),
}

pub type PeerEventSender = mpsc::UnboundedSender<(LinkTag, PeerEvent)>;

/// The media transport one link drives. Implementations own the actual ICE/DTLS
/// machinery; a link only sequences calls on it.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Builds a connection whose events are tagged with `tag` and pushed into `events`.
    async fn create(&self, tag: LinkTag, events: PeerEventSender)
    -> Result<Box<dyn PeerConnection>>;
}
