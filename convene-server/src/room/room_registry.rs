use crate::room::{Participant, Room};
use crate::signaling::SignalingOutput;
use convene_core::{ParticipantId, ParticipantSummary, RoomId, ServerMessage, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authoritative record of who is in which room.
///
/// Every operation is synchronous and runs to completion without yielding, so callers
/// that own the registry (the signaling hub) see each join/leave as atomic.
/// Membership notifications are pushed through the injected [`SignalingOutput`].
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomRegistry {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: HashMap::new(),
            signaling,
        }
    }

    /// Registers `participant` in `room_id`, creating the room on first join.
    ///
    /// Everyone else in the room is sent `user-connected`. Returns the other
    /// participants in join order; the joiner itself is never part of it. A duplicate
    /// id silently replaces the previous entry.
    pub fn join(&mut self, room_id: RoomId, participant: Participant) -> Vec<ParticipantSummary> {
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone())
        });

        let participant_id = participant.id.clone();
        let display_name = participant.name.clone();

        if let Some(previous) = room.upsert(participant) {
            warn!(
                "Participant {} in room {} overwritten (previous session {})",
                participant_id, room_id, previous.session
            );
        }

        let existing = room.summaries_except(&participant_id);

        let notice = ServerMessage::UserConnected {
            participant_id: participant_id.clone(),
            display_name: display_name.clone(),
        };
        for other in room.others(&participant_id) {
            self.signaling.deliver(other.session, notice.clone());
        }

        info!(
            "{} ({}) joined room {}. Total: {}",
            display_name,
            participant_id,
            room_id,
            room.len()
        );

        existing
    }

    /// Removes a participant. No-op when absent. Empty rooms are dropped; otherwise the
    /// remaining participants are sent `user-disconnected`.
    pub fn leave(
        &mut self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Option<Participant> {
        let room = self.rooms.get_mut(room_id)?;
        let removed = room.remove(participant_id)?;

        if room.is_empty() {
            self.rooms.remove(room_id);
            info!("{} left; room {} is empty and was removed", participant_id, room_id);
        } else {
            let notice = ServerMessage::UserDisconnected {
                participant_id: participant_id.clone(),
            };
            for remaining in room.iter() {
                self.signaling.deliver(remaining.session, notice.clone());
            }
            info!(
                "{} left room {}. Total: {}",
                participant_id,
                room_id,
                room.len()
            );
        }

        Some(removed)
    }

    /// Session currently registered for `participant_id` within `room_id`.
    pub fn find(&self, room_id: &RoomId, participant_id: &ParticipantId) -> Option<SessionId> {
        let session = self
            .rooms
            .get(room_id)?
            .get(participant_id)
            .map(|p| p.session);
        if session.is_none() {
            debug!("No participant {} in room {}", participant_id, room_id);
        }
        session
    }

    pub fn participants(&self, room_id: &RoomId) -> Vec<ParticipantSummary> {
        self.rooms
            .get(room_id)
            .map(|room| room.iter().map(Participant::summary).collect())
            .unwrap_or_default()
    }

    pub fn participant_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, Room::len)
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
