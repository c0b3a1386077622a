use crate::media::{LocalTrack, TrackKind};
use crate::peer::{LinkTag, PeerConnection, PeerConnectionFactory, PeerEventSender};
use anyhow::{Result, bail};
use async_trait::async_trait;
use convene_core::{IceCandidate, SessionDescription};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    AddTrack(TrackKind),
    CreateOffer,
    CreateAnswer,
    SetLocal(SessionDescription),
    SetRemote(SessionDescription),
    AddCandidate(String),
    Close,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    descriptions: AtomicUsize,
    reject_remote: AtomicBool,
    created: Mutex<Vec<LinkTag>>,
}

/// Records every call made on the connections it creates.
#[derive(Clone, Default)]
pub(crate) struct MockFactory {
    shared: Arc<Shared>,
}

impl MockFactory {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub(crate) fn added_candidates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddCandidate(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn created(&self) -> Vec<LinkTag> {
        self.shared.created.lock().unwrap().clone()
    }

    pub(crate) fn fail_remote_descriptions(&self) {
        self.shared.reject_remote.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PeerConnectionFactory for MockFactory {
    async fn create(
        &self,
        tag: LinkTag,
        _events: PeerEventSender,
    ) -> Result<Box<dyn PeerConnection>> {
        self.shared.created.lock().unwrap().push(tag);
        Ok(Box::new(MockConnection {
            shared: self.shared.clone(),
        }))
    }
}

struct MockConnection {
    shared: Arc<Shared>,
}

impl MockConnection {
    fn record(&self, call: Call) {
        self.shared.calls.lock().unwrap().push(call);
    }

    fn next_description(&self) -> usize {
        self.shared.descriptions.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        self.record(Call::AddTrack(track.kind()));
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateOffer);
        Ok(SessionDescription::offer(format!("offer-{}", self.next_description())))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateAnswer);
        Ok(SessionDescription::answer(format!("answer-{}", self.next_description())))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record(Call::SetLocal(description));
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        if self.shared.reject_remote.load(Ordering::SeqCst) {
            bail!("malformed session description");
        }
        self.record(Call::SetRemote(description));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(Call::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}
