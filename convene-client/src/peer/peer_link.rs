use crate::error::LinkError;
use crate::media::LocalTrack;
use crate::peer::{
    LinkTag, PeerConnection, PeerConnectionFactory, PeerEventSender, RemoteTrack, TransportState,
};
use convene_core::{IceCandidate, ParticipantId, SessionDescription};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Initiator,
    Responder,
}

impl fmt::Display for LinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkRole::Initiator => f.write_str("initiator"),
            LinkRole::Responder => f.write_str("responder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Negotiating,
    Connected,
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::New => "new",
            LinkState::Negotiating => "negotiating",
            LinkState::Connected => "connected",
            LinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Media the remote side sends over this link, grouped under its stream id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

/// Handshake state for one remote participant.
///
/// ```text
/// new --create_as_initiator--> negotiating   (offer sent)
/// new --create_as_responder--> negotiating   (waiting for offer)
/// negotiating --transport connected--> connected
/// negotiating | connected --transport failed/closed, close()--> closed
/// ```
///
/// Remote candidates that arrive before the remote description are held back and
/// applied in arrival order once it is set.
pub struct PeerLink {
    tag: LinkTag,
    role: LinkRole,
    state: LinkState,
    connection: Box<dyn PeerConnection>,
    local_tracks: Vec<LocalTrack>,
    remote_stream: Option<RemoteStream>,
    pending_candidates: VecDeque<IceCandidate>,
    has_local_description: bool,
    has_remote_description: bool,
    torn_down: bool,
}

impl PeerLink {
    async fn open(
        factory: &dyn PeerConnectionFactory,
        tag: LinkTag,
        role: LinkRole,
        events: PeerEventSender,
        tracks: &[LocalTrack],
    ) -> Result<Self, LinkError> {
        let connection = factory
            .create(tag.clone(), events)
            .await
            .map_err(LinkError::negotiation(&tag.remote, "create a peer connection"))?;

        let mut link = Self {
            tag,
            role,
            state: LinkState::New,
            connection,
            local_tracks: Vec::with_capacity(tracks.len()),
            remote_stream: None,
            pending_candidates: VecDeque::new(),
            has_local_description: false,
            has_remote_description: false,
            torn_down: false,
        };

        for track in tracks {
            if let Err(e) = link.connection.add_track(track).await {
                link.close().await;
                return Err(LinkError::negotiation(link.remote(), "attach a local track")(e));
            }
            link.local_tracks.push(track.clone());
        }

        link.state = LinkState::Negotiating;
        Ok(link)
    }

    /// Opens a link that offers first. Returns the offer to send to the remote.
    pub async fn create_as_initiator(
        factory: &dyn PeerConnectionFactory,
        tag: LinkTag,
        events: PeerEventSender,
        tracks: &[LocalTrack],
    ) -> Result<(Self, SessionDescription), LinkError> {
        let mut link = Self::open(factory, tag, LinkRole::Initiator, events, tracks).await?;

        let offer = match link.make_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                link.close().await;
                return Err(e);
            }
        };

        info!("Offering to {} ({} local tracks)", link.remote(), link.local_tracks.len());
        Ok((link, offer))
    }

    async fn make_offer(&mut self) -> Result<SessionDescription, LinkError> {
        let offer = self
            .connection
            .create_offer()
            .await
            .map_err(LinkError::negotiation(self.remote(), "create an offer"))?;
        self.connection
            .set_local_description(offer.clone())
            .await
            .map_err(LinkError::negotiation(self.remote(), "set the local offer"))?;
        self.has_local_description = true;
        Ok(offer)
    }

    /// Opens a link that waits for the remote's offer.
    pub async fn create_as_responder(
        factory: &dyn PeerConnectionFactory,
        tag: LinkTag,
        events: PeerEventSender,
        tracks: &[LocalTrack],
    ) -> Result<Self, LinkError> {
        let link = Self::open(factory, tag, LinkRole::Responder, events, tracks).await?;
        debug!("Waiting for offer from {}", link.remote());
        Ok(link)
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.tag.remote
    }

    pub fn tag(&self) -> &LinkTag {
        &self.tag
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn local_tracks(&self) -> &[LocalTrack] {
        &self.local_tracks
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.len()
    }

    fn illegal(&self, event: &'static str) -> LinkError {
        LinkError::IllegalTransition {
            remote: self.tag.remote.clone(),
            role: self.role,
            state: self.state,
            event,
        }
    }

    /// Applies the remote offer and returns the answer to send back.
    pub async fn receive_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, LinkError> {
        if self.role != LinkRole::Responder
            || self.state != LinkState::Negotiating
            || self.has_local_description
        {
            return Err(self.illegal("offer"));
        }

        self.apply_remote_description(offer, "set the remote offer")
            .await?;

        let answer = self
            .connection
            .create_answer()
            .await
            .map_err(LinkError::negotiation(self.remote(), "create an answer"))?;
        self.connection
            .set_local_description(answer.clone())
            .await
            .map_err(LinkError::negotiation(self.remote(), "set the local answer"))?;
        self.has_local_description = true;

        info!("Answering {}", self.remote());
        Ok(answer)
    }

    pub async fn receive_answer(&mut self, answer: SessionDescription) -> Result<(), LinkError> {
        if self.role != LinkRole::Initiator
            || self.state != LinkState::Negotiating
            || !self.has_local_description
            || self.has_remote_description
        {
            return Err(self.illegal("answer"));
        }

        self.apply_remote_description(answer, "set the remote answer")
            .await?;
        info!("Answer from {} applied", self.remote());
        Ok(())
    }

    pub async fn receive_candidate(&mut self, candidate: IceCandidate) -> Result<(), LinkError> {
        if !matches!(self.state, LinkState::Negotiating | LinkState::Connected) {
            return Err(self.illegal("ice-candidate"));
        }

        if !self.has_remote_description {
            self.pending_candidates.push_back(candidate);
            debug!(
                "Queued candidate from {} ({} pending)",
                self.remote(),
                self.pending_candidates.len()
            );
            return Ok(());
        }

        self.connection
            .add_ice_candidate(candidate)
            .await
            .map_err(LinkError::negotiation(self.remote(), "add a remote candidate"))
    }

    async fn apply_remote_description(
        &mut self,
        description: SessionDescription,
        step: &'static str,
    ) -> Result<(), LinkError> {
        self.connection
            .set_remote_description(description)
            .await
            .map_err(LinkError::negotiation(self.remote(), step))?;
        self.has_remote_description = true;
        self.flush_pending_candidates().await;
        Ok(())
    }

    /// Replays queued candidates in arrival order. A rejected candidate is logged and
    /// skipped; the remaining ones are still applied.
    async fn flush_pending_candidates(&mut self) {
        if self.pending_candidates.is_empty() {
            return;
        }
        debug!(
            "Applying {} queued candidates from {}",
            self.pending_candidates.len(),
            self.remote()
        );

        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = self.connection.add_ice_candidate(candidate).await {
                warn!("Queued candidate from {} rejected: {:#}", self.remote(), e);
            }
        }
    }

    /// Follows the transport's own connectivity signal. A failed or closed transport
    /// tears the link down. Returns whether the link state changed.
    pub async fn on_transport_state(&mut self, transport: TransportState) -> bool {
        let next = match (self.state, transport) {
            (LinkState::Negotiating, TransportState::Connected) => LinkState::Connected,
            (
                LinkState::Negotiating | LinkState::Connected,
                TransportState::Failed | TransportState::Closed,
            ) => LinkState::Closed,
            _ => return false,
        };

        info!("Link to {}: {} -> {}", self.remote(), self.state, next);
        if next == LinkState::Closed {
            self.close().await;
        } else {
            self.state = next;
        }
        true
    }

    /// Records a track the remote sends. Returns true when it opened the remote stream.
    pub fn attach_remote_track(&mut self, track: RemoteTrack) -> bool {
        match &mut self.remote_stream {
            Some(stream) => {
                if !stream.tracks.iter().any(|t| t.id == track.id) {
                    stream.tracks.push(track);
                }
                false
            }
            None => {
                self.remote_stream = Some(RemoteStream {
                    id: track.stream_id.clone(),
                    tracks: vec![track],
                });
                true
            }
        }
    }

    /// Tears the connection down and drops every attachment. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Err(e) = self.connection.close().await {
            warn!("Closing link to {} failed: {:#}", self.remote(), e);
        }

        self.state = LinkState::Closed;
        self.local_tracks.clear();
        self.remote_stream = None;
        self.pending_candidates.clear();
        debug!("Link to {} closed", self.remote());
    }
}
