use anyhow::{Context, Result};
use convene_core::{ClientMessage, ParticipantId, RoomId, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A participant speaking the signaling protocol over a real WebSocket.
pub struct TestClient {
    /// The identity this client joins with.
    pub participant_id: ParticipantId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a signaling connection to the server at `addr`.
    pub async fn connect(addr: SocketAddr, participant_id: &str) -> Result<Self> {
        let url = format!("ws://{addr}/ws");
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;

        Ok(Self {
            participant_id: ParticipantId::from(participant_id),
            socket,
        })
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.send_raw(&json).await
    }

    /// Send an arbitrary text frame, valid or not.
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::text(text.to_owned()))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    pub async fn join(&mut self, room: &str, display_name: &str) -> Result<()> {
        let message = ClientMessage::JoinRoom {
            room_id: RoomId::from(room),
            participant_id: self.participant_id.clone(),
            display_name: display_name.to_owned(),
        };
        self.send(&message).await
    }

    /// Next server message, or an error after `timeout_ms`.
    pub async fn recv(&mut self, timeout_ms: u64) -> Result<ServerMessage> {
        loop {
            let frame = tokio::time::timeout(Duration::from_millis(timeout_ms), self.socket.next())
                .await
                .context("Timeout waiting for server message")?
                .context("Socket closed")??;

            match frame {
                Message::Text(_) => {
                    let text = frame.to_text()?;
                    return serde_json::from_str(text).context("Server sent an invalid frame");
                }
                Message::Close(_) => anyhow::bail!("Server closed the connection"),
                _ => continue,
            }
        }
    }

    /// Asserts that nothing arrives within `timeout_ms`.
    pub async fn expect_silence(&mut self, timeout_ms: u64) -> Result<()> {
        match self.recv(timeout_ms).await {
            Ok(message) => anyhow::bail!("Expected silence, got {message:?}"),
            Err(_) => Ok(()),
        }
    }

    /// Close the connection abruptly from the client side.
    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.context("Failed to close socket")?;
        Ok(())
    }
}
