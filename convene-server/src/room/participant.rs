use convene_core::{ParticipantId, ParticipantSummary, SessionId};

/// One joined identity, bound to the signaling session that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub session: SessionId,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, session: SessionId) -> Self {
        Self {
            id,
            name: name.into(),
            session,
        }
    }

    pub fn summary(&self) -> ParticipantSummary {
        ParticipantSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}
