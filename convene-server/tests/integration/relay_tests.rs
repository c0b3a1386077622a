use anyhow::Result;
use convene_core::{ClientMessage, ParticipantId, ServerMessage};
use serde_json::json;

use super::init_tracing;
use crate::utils::{SIGNAL_TIMEOUT_MS, SILENCE_TIMEOUT_MS, TestClient, spawn_server};

/// Connects `a` then `b` to `room` and drains the join notifications.
async fn joined_pair(room: &str) -> Result<(TestClient, TestClient)> {
    let addr = spawn_server().await?;
    let mut a = TestClient::connect(addr, "a").await?;
    let mut b = TestClient::connect(addr, "b").await?;

    a.join(room, "Ada").await?;
    a.recv(SIGNAL_TIMEOUT_MS).await?;
    b.join(room, "Bob").await?;
    b.recv(SIGNAL_TIMEOUT_MS).await?;
    a.recv(SIGNAL_TIMEOUT_MS).await?;

    Ok((a, b))
}

#[tokio::test]
async fn test_offer_answer_and_candidate_are_relayed() -> Result<()> {
    init_tracing();
    let (mut a, mut b) = joined_pair("relay").await?;

    let offer = json!({"type": "offer", "sdp": "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\n"});
    a.send(&ClientMessage::Offer {
        from: ParticipantId::from("a"),
        to: ParticipantId::from("b"),
        session_description: offer.clone(),
    })
    .await?;

    let received = b.recv(SIGNAL_TIMEOUT_MS).await?;
    assert_eq!(
        received,
        ServerMessage::Offer {
            from: ParticipantId::from("a"),
            to: ParticipantId::from("b"),
            session_description: offer,
        }
    );

    let answer = json!({"type": "answer", "sdp": "v=0\r\n"});
    b.send(&ClientMessage::Answer {
        from: ParticipantId::from("b"),
        to: ParticipantId::from("a"),
        session_description: answer.clone(),
    })
    .await?;
    let received = a.recv(SIGNAL_TIMEOUT_MS).await?;
    assert!(matches!(
        received,
        ServerMessage::Answer { ref from, ref session_description, .. }
            if from.as_str() == "b" && *session_description == answer
    ));

    let candidate = json!({"candidate": "candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host", "sdpMid": "0", "sdpMLineIndex": 0});
    a.send(&ClientMessage::IceCandidate {
        from: ParticipantId::from("a"),
        to: ParticipantId::from("b"),
        candidate: candidate.clone(),
    })
    .await?;
    let received = b.recv(SIGNAL_TIMEOUT_MS).await?;
    assert!(matches!(
        received,
        ServerMessage::IceCandidate { candidate: ref c, .. } if *c == candidate
    ));

    Ok(())
}

#[tokio::test]
async fn test_signal_to_unknown_target_is_dropped() -> Result<()> {
    init_tracing();
    let (mut a, mut b) = joined_pair("ghosts").await?;

    a.send(&ClientMessage::Offer {
        from: ParticipantId::from("a"),
        to: ParticipantId::from("ghost"),
        session_description: json!({"type": "offer", "sdp": ""}),
    })
    .await?;

    a.expect_silence(SILENCE_TIMEOUT_MS).await?;
    b.expect_silence(SILENCE_TIMEOUT_MS).await?;

    // The sender's connection is still usable afterwards.
    a.send(&ClientMessage::Offer {
        from: ParticipantId::from("a"),
        to: ParticipantId::from("b"),
        session_description: json!({"type": "offer", "sdp": ""}),
    })
    .await?;
    assert!(matches!(
        b.recv(SIGNAL_TIMEOUT_MS).await?,
        ServerMessage::Offer { .. }
    ));

    Ok(())
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() -> Result<()> {
    init_tracing();
    let (mut a, mut b) = joined_pair("noise").await?;

    a.send_raw("not json").await?;
    a.send_raw(r#"{"type":"chat","text":"hi"}"#).await?;
    a.send_raw(r#"{"type":"offer","from":"a"}"#).await?;
    b.expect_silence(SILENCE_TIMEOUT_MS).await?;

    a.send(&ClientMessage::Answer {
        from: ParticipantId::from("a"),
        to: ParticipantId::from("b"),
        session_description: json!({"type": "answer", "sdp": ""}),
    })
    .await?;
    assert!(matches!(
        b.recv(SIGNAL_TIMEOUT_MS).await?,
        ServerMessage::Answer { .. }
    ));

    Ok(())
}
