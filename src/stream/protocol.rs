//! Comment stream wire types.
//!
//! The comment relay wraps every event in an envelope:
//!
//! ```json
//! { "message": { "type": "user", "user_name": "Alice",
//!                "content": "hello", "emote": "neutral" } }
//! ```
//!
//! Only `type == "user"` is acted upon downstream; other kinds are carried
//! through so the orchestrator can drop them in one place. All fields are
//! defaulted so partial payloads still parse.

use serde::Deserialize;

/// The only event kind the orchestrator acts on.
pub const USER_EVENT_KIND: &str = "user";

/// Outer envelope around every stream frame.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub message: InboundEvent,
}

/// One parsed event from the comment stream. Transient: consumed once,
/// never stored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    /// Event kind; anything other than "user" is ignored downstream.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Display name of whoever sent the comment
    #[serde(default)]
    pub user_name: String,

    /// Comment text to speak
    #[serde(default)]
    pub content: String,

    /// Emotion tag chosen by the relay
    #[serde(default)]
    pub emote: String,
}

impl InboundEvent {
    pub fn is_user(&self) -> bool {
        self.kind == USER_EVENT_KIND
    }

    /// True when there is something to speak. Whitespace-only content is
    /// treated the same as empty.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}
