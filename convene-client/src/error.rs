use crate::peer::{LinkRole, LinkState};
use convene_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{event} is not allowed on {role} link to {remote} while {state}")]
    IllegalTransition {
        remote: ParticipantId,
        role: LinkRole,
        state: LinkState,
        event: &'static str,
    },

    #[error("negotiation with {remote} failed while trying to {step}")]
    Negotiation {
        remote: ParticipantId,
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl LinkError {
    pub(crate) fn negotiation(
        remote: &ParticipantId,
        step: &'static str,
    ) -> impl FnOnce(anyhow::Error) -> Self + use<> {
        let remote = remote.clone();
        move |source| LinkError::Negotiation {
            remote,
            step,
            source,
        }
    }
}

/// Why local capture could not be started. The display text is meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error(
        "Camera/microphone access was denied. Allow access for this application in your system settings and try again."
    )]
    Denied,

    #[error("No camera or microphone was found.")]
    NotFound,

    #[error("The camera or microphone is being used by another application.")]
    DeviceBusy,

    #[error("Media access failed: {0}")]
    Other(String),

    #[error("Local media is already acquired for this session.")]
    AlreadyAcquired,
}
