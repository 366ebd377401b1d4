//! Live comment stream module.
//!
//! Maintains the persistent WebSocket connection to the external comment
//! source and turns raw frames into parsed inbound events.
//!
//! # Connection lifecycle
//!
//! ```text
//! StreamSession::connect() ──▶ receiver task ──channel──▶ orchestrator
//!                                    │
//!                                    └─ close / error ⇒ channel ends,
//!                                       supervisor opens one new attempt
//! ```
//!
//! Exactly one session is live at a time; the orchestrator's link state is
//! what enforces that, this module only owns a single socket per session.

mod client;
pub mod protocol;

pub use client::StreamSession;

/// Errors that can occur on the comment stream connection
#[derive(Debug, Clone)]
pub enum StreamError {
    /// Failed to establish the WebSocket connection
    ConnectionFailed(String),
    /// Connection was closed unexpectedly
    Disconnected(String),
    /// WebSocket protocol error
    ProtocolError(String),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::ConnectionFailed(e) => {
                write!(f, "Failed to connect to comment stream: {}", e)
            }
            StreamError::Disconnected(e) => {
                write!(f, "Comment stream disconnected: {}", e)
            }
            StreamError::ProtocolError(e) => {
                write!(f, "WebSocket protocol error: {}", e)
            }
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_display() {
        let err = StreamError::ConnectionFailed("timeout".to_string());
        assert!(err.to_string().contains("timeout"));

        let err = StreamError::Disconnected("remote close".to_string());
        assert!(err.to_string().contains("remote close"));

        let err = StreamError::ProtocolError("bad frame".to_string());
        assert!(err.to_string().contains("bad frame"));
    }
}
