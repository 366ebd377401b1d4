//! Comment stream WebSocket client
//!
//! Owns one live connection to the comment relay.
//!
//! # Connection Flow
//!
//! 1. `connect()` - Establish the WebSocket with a handshake timeout
//! 2. `recv()` - Get parsed inbound frames in arrival order
//! 3. `recv()` returning `None` - the connection is gone; drop the session
//!
//! Reconnection is not handled here: the orchestrator supervises the
//! session and opens exactly one new attempt per closure.
//!
//! Malformed frames are dropped and logged at warn level, never fatal.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use super::protocol::InboundFrame;
use super::StreamError;

/// Connection timeout for the WebSocket handshake
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to one live comment stream connection
///
/// The session owns the socket write half and the background receiver task;
/// parsed frames arrive through an internal channel in arrival order.
#[derive(Debug)]
pub struct StreamSession {
    /// WebSocket write half, kept for a clean close frame on disconnect
    write: futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    /// Channel receiver for parsed inbound frames
    incoming_rx: mpsc::Receiver<InboundFrame>,
    /// Local id for correlating log lines across one connection's lifetime
    session_id: Uuid,
    /// Handle to the receiver task (for cleanup on drop)
    receiver_task: tokio::task::JoinHandle<()>,
}

impl StreamSession {
    /// Establish a connection to the comment relay.
    ///
    /// Fails on handshake timeout or transport error; the caller decides
    /// whether and when to try again.
    pub async fn connect(url: &str) -> Result<Self, StreamError> {
        let session_id = Uuid::new_v4();
        log::info!("[{}] connecting to comment stream at {}", session_id, url);

        let (ws_stream, _response) = timeout(CONNECTION_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| StreamError::ConnectionFailed("Connection timeout".to_string()))?
            .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;

        let (write, mut read) = ws_stream.split();

        // Frames are forwarded in arrival order; the channel is the only
        // path into the orchestrator, so ordering is preserved end to end.
        let (incoming_tx, incoming_rx) = mpsc::channel(100);

        let receiver_task = tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<InboundFrame>(&text) {
                        Ok(frame) => {
                            if incoming_tx.send(frame).await.is_err() {
                                log::debug!("[{}] receiver channel closed", session_id);
                                break;
                            }
                        }
                        Err(e) => {
                            log::warn!("[{}] dropping malformed frame: {}", session_id, e);
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        log::info!("[{}] stream closed by remote: {:?}", session_id, frame);
                        break;
                    }
                    Err(e) => {
                        log::warn!("[{}] stream error: {}", session_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }
            log::debug!("[{}] receiver task exiting", session_id);
        });

        log::info!("[{}] comment stream connected", session_id);

        Ok(Self {
            write,
            incoming_rx,
            session_id,
            receiver_task,
        })
    }

    /// Receive the next parsed frame.
    ///
    /// Returns `None` once the connection has closed for any reason; the
    /// session is then spent and should be dropped.
    pub async fn recv(&mut self) -> Option<InboundFrame> {
        self.incoming_rx.recv().await
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Gracefully disconnect, sending a close frame.
    pub async fn disconnect(mut self) {
        log::info!("[{}] disconnecting from comment stream", self.session_id);
        self.receiver_task.abort();
        if let Err(e) = self.write.close().await {
            log::warn!("[{}] error closing stream: {}", self.session_id, e);
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // Ensure the receiver task dies with the session
        self.receiver_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_unreachable_relay_fails() {
        // Port 9 (discard) is almost never listening; either refusal or
        // timeout maps to ConnectionFailed.
        let result = StreamSession::connect("ws://127.0.0.1:9/stream").await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            StreamError::ConnectionFailed(_)
        ));
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let result = StreamSession::connect("not a url").await;
        assert!(result.is_err());
    }
}
