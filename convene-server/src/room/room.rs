use crate::room::Participant;
use convene_core::{ParticipantId, ParticipantSummary, RoomId};

/// Join-ordered membership of a single room.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    participants: Vec<Participant>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            participants: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Registers `participant`. An entry with the same id is overwritten in place and
    /// handed back.
    pub fn upsert(&mut self, participant: Participant) -> Option<Participant> {
        match self.position(&participant.id) {
            Some(idx) => Some(std::mem::replace(&mut self.participants[idx], participant)),
            None => {
                self.participants.push(participant);
                None
            }
        }
    }

    pub fn remove(&mut self, participant_id: &ParticipantId) -> Option<Participant> {
        let idx = self.position(participant_id)?;
        Some(self.participants.remove(idx))
    }

    pub fn get(&self, participant_id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == participant_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn others<'a>(
        &'a self,
        participant_id: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a Participant> + 'a {
        self.participants.iter().filter(move |p| &p.id != participant_id)
    }

    pub fn summaries_except(&self, participant_id: &ParticipantId) -> Vec<ParticipantSummary> {
        self.others(participant_id).map(Participant::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    fn position(&self, participant_id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == participant_id)
    }
}
