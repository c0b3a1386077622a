use anyhow::Result;
use convene_core::{ParticipantId, ParticipantSummary, RoomId, ServerMessage, SessionId, Signal, SignalKind};
use convene_server::{HubHandle, InboundEvent};
use serde_json::json;

use super::{create_test_hub, init_tracing};
use crate::utils::{SIGNAL_TIMEOUT_MS, wait_for_delivery};

async fn join(hub: &HubHandle, session: SessionId, room: &str, id: &str, name: &str) -> Result<()> {
    hub.dispatch(
        session,
        InboundEvent::Join {
            room_id: RoomId::from(room),
            participant_id: ParticipantId::from(id),
            display_name: name.to_string(),
        },
    )
    .await?;
    Ok(())
}

fn summary(id: &str, name: &str) -> ParticipantSummary {
    ParticipantSummary {
        id: ParticipantId::from(id),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_three_participants_see_roster_in_join_order() -> Result<()> {
    init_tracing();
    let (hub, mut rx, signaling) = create_test_hub();
    let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());

    join(&hub, a, "r1", "a", "Ada").await?;
    let first = wait_for_delivery(&mut rx, a, SIGNAL_TIMEOUT_MS).await?;
    assert_eq!(first, ServerMessage::ExistingUsers { users: vec![] });

    join(&hub, b, "r1", "b", "Bob").await?;
    wait_for_delivery(&mut rx, b, SIGNAL_TIMEOUT_MS).await?;

    join(&hub, c, "r1", "c", "Cy").await?;
    let roster = wait_for_delivery(&mut rx, c, SIGNAL_TIMEOUT_MS).await?;
    assert_eq!(
        roster,
        ServerMessage::ExistingUsers {
            users: vec![summary("a", "Ada"), summary("b", "Bob")],
        }
    );

    let seen_by_a = signaling.delivered_to(a);
    assert_eq!(
        seen_by_a,
        vec![
            ServerMessage::ExistingUsers { users: vec![] },
            ServerMessage::UserConnected {
                participant_id: ParticipantId::from("b"),
                display_name: "Bob".to_string(),
            },
            ServerMessage::UserConnected {
                participant_id: ParticipantId::from("c"),
                display_name: "Cy".to_string(),
            },
        ]
    );
    assert!(
        signaling
            .delivered_to(c)
            .iter()
            .all(|m| !matches!(m, ServerMessage::UserConnected { .. })),
        "joiner must not be told about itself"
    );

    Ok(())
}

#[tokio::test]
async fn test_rooms_are_isolated() -> Result<()> {
    init_tracing();
    let (hub, mut rx, signaling) = create_test_hub();
    let (a, b) = (SessionId::new(), SessionId::new());

    join(&hub, a, "r1", "a", "Ada").await?;
    wait_for_delivery(&mut rx, a, SIGNAL_TIMEOUT_MS).await?;
    join(&hub, b, "r2", "b", "Bob").await?;
    let roster = wait_for_delivery(&mut rx, b, SIGNAL_TIMEOUT_MS).await?;

    assert_eq!(roster, ServerMessage::ExistingUsers { users: vec![] });
    assert_eq!(signaling.delivered_to(a).len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_identity_is_taken_over_by_latest_session() -> Result<()> {
    init_tracing();
    let (hub, mut rx, signaling) = create_test_hub();
    let (old, new, peer) = (SessionId::new(), SessionId::new(), SessionId::new());

    join(&hub, peer, "r1", "p", "Pat").await?;
    wait_for_delivery(&mut rx, peer, SIGNAL_TIMEOUT_MS).await?;
    join(&hub, old, "r1", "a", "Ada").await?;
    wait_for_delivery(&mut rx, old, SIGNAL_TIMEOUT_MS).await?;
    join(&hub, new, "r1", "a", "Ada again").await?;
    wait_for_delivery(&mut rx, new, SIGNAL_TIMEOUT_MS).await?;

    // The stale session closing must not evict its successor.
    hub.dispatch(old, InboundEvent::Disconnect).await?;

    hub.dispatch(
        peer,
        InboundEvent::Signal(Signal::new(
            SignalKind::Offer,
            ParticipantId::from("p"),
            ParticipantId::from("a"),
            json!({"type": "offer", "sdp": "v=0"}),
        )),
    )
    .await?;

    let relayed = wait_for_delivery(&mut rx, new, SIGNAL_TIMEOUT_MS).await?;
    assert!(matches!(relayed, ServerMessage::Offer { ref from, .. } if from.as_str() == "p"));
    assert!(
        !signaling
            .delivered_to(peer)
            .iter()
            .any(|m| matches!(m, ServerMessage::UserDisconnected { .. })),
        "takeover must not announce a departure"
    );

    Ok(())
}
