use crate::error::MediaError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug)]
struct TrackState {
    enabled: AtomicBool,
    ended: AtomicBool,
}

/// Handle to one captured track. Clones share the same enabled/ended flags.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    state: Arc<TrackState>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            state: Arc::new(TrackState {
                enabled: AtomicBool::new(true),
                ended: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_ended(&self) -> bool {
        self.state.ended.load(Ordering::Acquire)
    }

    /// Ends the track for good. Producers stop feeding it.
    pub fn stop(&self) {
        self.state.enabled.store(false, Ordering::Release);
        self.state.ended.store(true, Ordering::Release);
    }
}

/// The participant's captured stream: zero or more tracks, acquired once per session.
#[derive(Debug, Clone, Default)]
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn first_of(&self, kind: TrackKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|track| track.kind() == kind)
    }

    pub fn has(&self, kind: TrackKind) -> bool {
        self.first_of(kind).is_some()
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            debug!("Stopping local {} track {}", track.kind(), track.id());
            track.stop();
        }
    }
}

/// Where local capture comes from: a device layer, a file, or a synthetic generator.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;
}

/// Synthetic capture for headless participants. Produces the requested track kinds
/// without touching any device.
#[derive(Debug, Clone, Copy)]
pub struct StaticMediaSource {
    pub audio: bool,
    pub video: bool,
}

impl StaticMediaSource {
    pub fn new(audio: bool, video: bool) -> Self {
        Self { audio, video }
    }
}

impl Default for StaticMediaSource {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        let mut tracks = Vec::new();
        if self.audio {
            tracks.push(LocalTrack::new(TrackKind::Audio));
        }
        if self.video {
            tracks.push(LocalTrack::new(TrackKind::Video));
        }

        if tracks.is_empty() {
            return Err(MediaError::NotFound);
        }

        info!("Synthetic media ready: audio={} video={}", self.audio, self.video);
        Ok(LocalMedia::new(tracks))
    }
}
