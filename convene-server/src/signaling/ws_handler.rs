use crate::error::SignalingError;
use crate::http::AppState;
use crate::signaling::InboundEvent;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use convene_core::{ClientMessage, SessionId};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn decode_frame(text: &str) -> Result<InboundEvent, SignalingError> {
    let message: ClientMessage = serde_json::from_str(text)?;
    Ok(message.into())
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = SessionId::new();
    info!("New WebSocket connection: {}", session);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_session(session, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let hub = state.hub.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match decode_frame(text.as_str()) {
                        Ok(event) => {
                            if let Err(e) = hub.dispatch(session, event).await {
                                error!("Session {}: {}", session, e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid frame from {}: {}", session, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Disconnect goes in after everything the reader forwarded, whichever half ended first.
    if let Err(e) = state.hub.dispatch(session, InboundEvent::Disconnect).await {
        error!("Session {}: {}", session, e);
    }
    state.signaling.remove_session(&session);
    info!("WebSocket disconnected: {}", session);
}
