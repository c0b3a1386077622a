use anyhow::Result;
use async_trait::async_trait;
use convene_client::{
    LinkTag, LocalTrack, PeerConnection, PeerConnectionFactory, PeerEvent, PeerEventSender,
    TransportState,
};
use convene_core::{IceCandidate, SessionDescription};
use std::sync::{Arc, Mutex};

/// Stand-in transport: produces one local candidate per local description and reports
/// itself connected once both descriptions are in place.
#[derive(Clone, Default)]
pub struct LoopbackFactory {
    remote_candidates: Arc<Mutex<Vec<(LinkTag, String)>>>,
}

impl LoopbackFactory {
    /// Candidates applied so far, with the link they were applied to.
    pub fn remote_candidates(&self) -> Vec<(LinkTag, String)> {
        self.remote_candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerConnectionFactory for LoopbackFactory {
    async fn create(&self, tag: LinkTag, events: PeerEventSender) -> Result<Box<dyn PeerConnection>> {
        tracing::debug!("[Loopback] create link to {}", tag.remote);
        Ok(Box::new(LoopbackConnection {
            tag,
            events,
            remote_candidates: self.remote_candidates.clone(),
            descriptions: Mutex::new((false, false)),
        }))
    }
}

struct LoopbackConnection {
    tag: LinkTag,
    events: PeerEventSender,
    remote_candidates: Arc<Mutex<Vec<(LinkTag, String)>>>,
    /// (local set, remote set)
    descriptions: Mutex<(bool, bool)>,
}

impl LoopbackConnection {
    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send((self.tag.clone(), event));
    }

    fn mark(&self, local: bool) {
        let both = {
            let mut set = self.descriptions.lock().unwrap();
            if local {
                set.0 = true;
            } else {
                set.1 = true;
            }
            set.0 && set.1
        };
        if both {
            self.emit(PeerEvent::TransportState(TransportState::Connected));
        }
    }
}

#[async_trait]
impl PeerConnection for LoopbackConnection {
    async fn add_track(&self, _track: &LocalTrack) -> Result<()> {
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::offer(format!("v=0 offer to {}", self.tag.remote)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::answer(format!("v=0 answer to {}", self.tag.remote)))
    }

    async fn set_local_description(&self, _description: SessionDescription) -> Result<()> {
        self.emit(PeerEvent::LocalCandidate(IceCandidate::new(format!(
            "candidate for {}",
            self.tag.remote
        ))));
        self.mark(true);
        Ok(())
    }

    async fn set_remote_description(&self, _description: SessionDescription) -> Result<()> {
        self.mark(false);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.remote_candidates
            .lock()
            .unwrap()
            .push((self.tag.clone(), candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.emit(PeerEvent::TransportState(TransportState::Closed));
        Ok(())
    }
}
