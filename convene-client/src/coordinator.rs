use crate::error::MediaError;
use crate::media::{LocalMedia, LocalTrack, MediaSource, TrackKind};
use crate::peer::{
    LinkState, LinkTag, PeerConnectionFactory, PeerEvent, PeerEventSender, PeerLink, RemoteTrack,
};
use convene_core::{
    ClientMessage, IceCandidate, ParticipantId, ParticipantSummary, RoomId, ServerMessage,
    SessionDescription,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Who this coordinator speaks for.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub display_name: String,
}

/// What the coordinator reports to whoever renders the call.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    LocalMediaReady { audio: bool, video: bool },
    MediaUnavailable(MediaError),
    ParticipantJoined(ParticipantSummary),
    ParticipantLeft(ParticipantId),
    LinkStateChanged {
        remote: ParticipantId,
        state: LinkState,
    },
    RemoteTrackAdded {
        remote: ParticipantId,
        track: RemoteTrack,
    },
    TrackToggled { kind: TrackKind, enabled: bool },
    Left,
}

/// Local user actions fed into [`SessionCoordinator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    ToggleAudio,
    ToggleVideo,
    Leave,
}

/// Client side of one participant's call.
///
/// Owns local media and one [`PeerLink`] per known remote participant, and turns
/// membership notifications into handshakes: a newcomer is offered to, existing
/// participants are waited on.
pub struct SessionCoordinator {
    settings: SessionSettings,
    factory: Arc<dyn PeerConnectionFactory>,
    media_source: Arc<dyn MediaSource>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    events: mpsc::UnboundedSender<CoordinatorEvent>,
    peer_tx: PeerEventSender,
    peer_rx: Option<mpsc::UnboundedReceiver<(LinkTag, PeerEvent)>>,
    local_media: Option<Arc<LocalMedia>>,
    links: HashMap<ParticipantId, PeerLink>,
    roster: Vec<ParticipantSummary>,
    next_generation: u64,
}

impl SessionCoordinator {
    pub fn new(
        settings: SessionSettings,
        factory: Arc<dyn PeerConnectionFactory>,
        media_source: Arc<dyn MediaSource>,
        outbound: mpsc::UnboundedSender<ClientMessage>,
    ) -> (Self, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            settings,
            factory,
            media_source,
            outbound,
            events,
            peer_tx,
            peer_rx: Some(peer_rx),
            local_media: None,
            links: HashMap::new(),
            roster: Vec::new(),
            next_generation: 0,
        };
        (coordinator, events_rx)
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.settings.participant_id
    }

    /// Remote participants in the order they became known.
    pub fn roster(&self) -> &[ParticipantSummary] {
        &self.roster
    }

    pub fn link_state(&self, remote: &ParticipantId) -> Option<LinkState> {
        self.links.get(remote).map(PeerLink::state)
    }

    pub fn link(&self, remote: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn local_media(&self) -> Option<&LocalMedia> {
        self.local_media.as_deref()
    }

    fn emit(&self, event: CoordinatorEvent) {
        if self.events.send(event).is_err() {
            debug!("No one is listening for coordinator events");
        }
    }

    fn send(&self, message: ClientMessage) {
        if self.outbound.send(message).is_err() {
            warn!("Signaling connection is gone; dropping outbound message");
        }
    }

    /// Acquires local media once. An acquisition failure is reported through
    /// [`CoordinatorEvent::MediaUnavailable`] and the session continues without media.
    pub async fn start(&mut self) -> Result<(), MediaError> {
        if self.local_media.is_some() {
            return Err(MediaError::AlreadyAcquired);
        }

        match self.media_source.acquire().await {
            Ok(media) => {
                let audio = media.has(TrackKind::Audio);
                let video = media.has(TrackKind::Video);
                info!("Local media acquired: audio={} video={}", audio, video);
                self.local_media = Some(Arc::new(media));
                self.emit(CoordinatorEvent::LocalMediaReady { audio, video });
            }
            Err(e) => {
                warn!("Continuing without local media: {}", e);
                self.emit(CoordinatorEvent::MediaUnavailable(e));
            }
        }
        Ok(())
    }

    pub fn join(&self) {
        info!(
            "Joining room {} as {} ({})",
            self.settings.room_id, self.settings.participant_id, self.settings.display_name
        );
        self.send(ClientMessage::JoinRoom {
            room_id: self.settings.room_id.clone(),
            participant_id: self.settings.participant_id.clone(),
            display_name: self.settings.display_name.clone(),
        });
    }

    pub async fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ExistingUsers { users } => self.on_existing_users(users).await,
            ServerMessage::UserConnected {
                participant_id,
                display_name,
            } => self.on_user_connected(participant_id, display_name).await,
            ServerMessage::UserDisconnected { participant_id } => {
                self.on_user_disconnected(participant_id).await
            }
            ServerMessage::Offer {
                from,
                to,
                session_description,
            } => {
                if self.addressed_to_me(&to, "offer") {
                    self.on_offer(from, session_description).await;
                }
            }
            ServerMessage::Answer {
                from,
                to,
                session_description,
            } => {
                if self.addressed_to_me(&to, "answer") {
                    self.on_answer(from, session_description).await;
                }
            }
            ServerMessage::IceCandidate {
                from,
                to,
                candidate,
            } => {
                if self.addressed_to_me(&to, "ice-candidate") {
                    self.on_remote_candidate(from, candidate).await;
                }
            }
        }
    }

    fn addressed_to_me(&self, to: &ParticipantId, kind: &str) -> bool {
        if *to == self.settings.participant_id {
            return true;
        }
        warn!("Ignoring {} addressed to {}", kind, to);
        false
    }

    async fn on_existing_users(&mut self, users: Vec<ParticipantSummary>) {
        info!("{} participant(s) already in the room", users.len());

        for user in users {
            if user.id == self.settings.participant_id {
                continue;
            }
            let remote = user.id.clone();
            self.remember(user);
            if !self.links.contains_key(&remote) {
                self.open_responder(&remote).await;
            }
        }
    }

    async fn on_user_connected(&mut self, remote: ParticipantId, display_name: String) {
        if remote == self.settings.participant_id {
            return;
        }
        info!("{} ({}) joined", display_name, remote);
        self.remember(ParticipantSummary {
            id: remote.clone(),
            name: display_name,
        });

        if let Some(mut stale) = self.links.remove(&remote) {
            debug!("Replacing existing link to {}", remote);
            stale.close().await;
        }

        let tag = self.next_tag(&remote);
        let tracks = self.local_tracks();
        match PeerLink::create_as_initiator(
            self.factory.as_ref(),
            tag,
            self.peer_tx.clone(),
            &tracks,
        )
        .await
        {
            Ok((link, offer)) => {
                self.links.insert(remote.clone(), link);
                self.send(ClientMessage::Offer {
                    from: self.settings.participant_id.clone(),
                    to: remote,
                    session_description: offer.to_value(),
                });
            }
            Err(e) => warn!("Could not open link to {}: {:#}", remote, e),
        }
    }

    async fn on_user_disconnected(&mut self, remote: ParticipantId) {
        info!("{} left", remote);
        let before = self.roster.len();
        self.roster.retain(|p| p.id != remote);
        if self.roster.len() != before {
            self.emit(CoordinatorEvent::ParticipantLeft(remote.clone()));
        }

        if let Some(mut link) = self.links.remove(&remote) {
            link.close().await;
            self.emit(CoordinatorEvent::LinkStateChanged {
                remote,
                state: LinkState::Closed,
            });
        }
    }

    async fn on_offer(&mut self, from: ParticipantId, payload: Value) {
        let offer = match SessionDescription::from_value(payload) {
            Ok(offer) => offer,
            Err(e) => {
                warn!("Malformed offer from {}: {}", from, e);
                return;
            }
        };

        let Some(link) = self.responder_for(&from).await else {
            return;
        };
        match link.receive_offer(offer).await {
            Ok(answer) => self.send(ClientMessage::Answer {
                from: self.settings.participant_id.clone(),
                to: from,
                session_description: answer.to_value(),
            }),
            Err(e) => warn!("Offer from {} not applied: {:#}", from, e),
        }
    }

    async fn on_answer(&mut self, from: ParticipantId, payload: Value) {
        let answer = match SessionDescription::from_value(payload) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Malformed answer from {}: {}", from, e);
                return;
            }
        };

        let Some(link) = self.links.get_mut(&from) else {
            warn!("Answer from {} without a link", from);
            return;
        };
        if let Err(e) = link.receive_answer(answer).await {
            warn!("Answer from {} not applied: {:#}", from, e);
        }
    }

    async fn on_remote_candidate(&mut self, from: ParticipantId, payload: Value) {
        let candidate = match IceCandidate::from_value(payload) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Malformed candidate from {}: {}", from, e);
                return;
            }
        };

        let Some(link) = self.responder_for(&from).await else {
            return;
        };
        if let Err(e) = link.receive_candidate(candidate).await {
            warn!("Candidate from {} not applied: {:#}", from, e);
        }
    }

    /// The link to `remote`, opening a responder on the spot when the handshake
    /// outran the membership notification.
    async fn responder_for(&mut self, remote: &ParticipantId) -> Option<&mut PeerLink> {
        if !self.links.contains_key(remote) {
            debug!("Handshake from unknown {}; opening responder", remote);
            self.open_responder(remote).await;
        }
        self.links.get_mut(remote)
    }

    async fn open_responder(&mut self, remote: &ParticipantId) {
        let tag = self.next_tag(remote);
        let tracks = self.local_tracks();
        match PeerLink::create_as_responder(
            self.factory.as_ref(),
            tag,
            self.peer_tx.clone(),
            &tracks,
        )
        .await
        {
            Ok(link) => {
                self.links.insert(remote.clone(), link);
            }
            Err(e) => warn!("Could not open link to {}: {:#}", remote, e),
        }
    }

    fn next_tag(&mut self, remote: &ParticipantId) -> LinkTag {
        self.next_generation += 1;
        LinkTag {
            remote: remote.clone(),
            generation: self.next_generation,
        }
    }

    fn local_tracks(&self) -> Vec<LocalTrack> {
        self.local_media
            .as_ref()
            .map(|media| media.tracks().to_vec())
            .unwrap_or_default()
    }

    fn remember(&mut self, participant: ParticipantSummary) {
        match self.roster.iter_mut().find(|p| p.id == participant.id) {
            Some(known) => known.name = participant.name,
            None => {
                self.roster.push(participant.clone());
                self.emit(CoordinatorEvent::ParticipantJoined(participant));
            }
        }
    }

    pub async fn handle_peer_event(&mut self, tag: LinkTag, event: PeerEvent) {
        let Some(link) = self.links.get_mut(&tag.remote) else {
            debug!("Event for {} after its link was dropped", tag.remote);
            return;
        };
        if link.tag().generation != tag.generation {
            debug!("Event from a replaced link to {}", tag.remote);
            return;
        }

        match event {
            PeerEvent::LocalCandidate(candidate) => {
                if link.state() == LinkState::Closed {
                    return;
                }
                self.send(ClientMessage::IceCandidate {
                    from: self.settings.participant_id.clone(),
                    to: tag.remote,
                    candidate: candidate.to_value(),
                });
            }
            PeerEvent::TransportState(state) => {
                if link.on_transport_state(state).await {
                    let state = link.state();
                    self.emit(CoordinatorEvent::LinkStateChanged {
                        remote: tag.remote,
                        state,
                    });
                }
            }
            PeerEvent::RemoteTrack(track) => {
                if link.attach_remote_track(track.clone()) {
                    info!("Receiving media from {}", tag.remote);
                }
                self.emit(CoordinatorEvent::RemoteTrackAdded {
                    remote: tag.remote,
                    track,
                });
            }
        }
    }

    pub fn toggle_audio(&self) -> Option<bool> {
        self.toggle(TrackKind::Audio)
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.toggle(TrackKind::Video)
    }

    /// Flips the first track of `kind`. `None` when there is no such track.
    fn toggle(&self, kind: TrackKind) -> Option<bool> {
        let track = self.local_media.as_ref()?.first_of(kind)?;
        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        info!("Local {} {}", kind, if enabled { "on" } else { "off" });
        self.emit(CoordinatorEvent::TrackToggled { kind, enabled });
        Some(enabled)
    }

    /// Closes every link, stops local media and forgets the roster.
    pub async fn leave(&mut self) {
        info!(
            "Leaving room {} ({} links)",
            self.settings.room_id,
            self.links.len()
        );
        for (_, mut link) in self.links.drain() {
            link.close().await;
        }
        if let Some(media) = self.local_media.take() {
            media.stop();
        }
        self.roster.clear();
        self.emit(CoordinatorEvent::Left);
    }

    /// Drives the session until the user leaves or the signaling connection closes.
    ///
    /// Dropping the command sender only stops local commands; the session keeps
    /// running on signaling and peer events.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<ServerMessage>,
        mut commands: mpsc::UnboundedReceiver<LocalCommand>,
    ) {
        let Some(mut peer_rx) = self.peer_rx.take() else {
            warn!("Coordinator event loop already taken");
            return;
        };

        let mut commands_open = true;
        loop {
            tokio::select! {
                message = inbound.recv() => match message {
                    Some(message) => self.handle_server_message(message).await,
                    None => {
                        info!("Signaling connection closed");
                        break;
                    }
                },
                Some((tag, event)) = peer_rx.recv() => {
                    self.handle_peer_event(tag, event).await;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(LocalCommand::ToggleAudio) => {
                        self.toggle_audio();
                    }
                    Some(LocalCommand::ToggleVideo) => {
                        self.toggle_video();
                    }
                    Some(LocalCommand::Leave) => break,
                    None => {
                        debug!("Local command channel closed");
                        commands_open = false;
                    }
                },
            }
        }

        self.leave().await;
    }
}
