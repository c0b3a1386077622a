use anyhow::Result;
use clap::Parser;
use convene_client::{
    CoordinatorEvent, LocalCommand, RtcConfig, SessionCoordinator, SessionSettings,
    SignalingClient, StaticMediaSource, TrackKind, WebRtcPeerFactory, spawn_silence,
};
use convene_core::{ParticipantId, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless call participant.
#[derive(Debug, Parser)]
#[command(name = "convene-peer", version)]
struct PeerArgs {
    /// Room to join.
    room: String,

    /// Name shown to other participants.
    #[arg(short, long, default_value = "convene-peer")]
    name: String,

    #[arg(long, env = "CONVENE_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Participant id; a random one is generated when omitted.
    #[arg(long)]
    id: Option<String>,

    /// ICE server URL. Repeat for several; defaults to public STUN.
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,

    #[arg(long)]
    no_audio: bool,

    #[arg(long)]
    no_video: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = PeerArgs::parse();
    let participant_id = args.id.map(ParticipantId::from).unwrap_or_default();

    let signaling = SignalingClient::connect(&args.url).await?;
    let (outbound, inbound) = signaling.into_parts();

    let factory = Arc::new(WebRtcPeerFactory::new(RtcConfig::with_ice_servers(
        args.ice_servers,
    )));
    let media = Arc::new(StaticMediaSource::new(!args.no_audio, !args.no_video));

    let (mut coordinator, mut events) = SessionCoordinator::new(
        SessionSettings {
            room_id: RoomId::from(args.room),
            participant_id,
            display_name: args.name,
        },
        factory.clone(),
        media,
        outbound,
    );

    coordinator.start().await?;
    if let Some(audio) = coordinator
        .local_media()
        .and_then(|media| media.first_of(TrackKind::Audio))
    {
        spawn_silence(factory.sample_track(audio)?, audio.clone());
    }
    coordinator.join();

    let (commands, commands_rx) = mpsc::unbounded_channel();
    let mut session = tokio::spawn(coordinator.run(inbound, commands_rx));

    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CoordinatorEvent::MediaUnavailable(e) => warn!("{}", e),
                CoordinatorEvent::ParticipantJoined(p) => info!("+ {} ({})", p.name, p.id),
                CoordinatorEvent::ParticipantLeft(id) => info!("- {}", id),
                CoordinatorEvent::LinkStateChanged { remote, state } => {
                    info!("link {} {}", remote, state)
                }
                CoordinatorEvent::Left => break,
                other => info!("{:?}", other),
            }
        }
    });

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        _ = &mut session => false,
    };

    if interrupted {
        info!("Interrupted, leaving");
        let _ = commands.send(LocalCommand::Leave);
        let _ = session.await;
    } else {
        info!("Session ended");
    }

    let _ = reporter.await;
    Ok(())
}
