//! Persisted conversation state.
//!
//! One JSON slot under the platform config dir holding the serialized
//! `ConversationState`. Read once at startup, overwritten in full on every
//! mutation; later writes simply supersede earlier ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::messages::{ChatMessage, VoiceParams};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;

const STATE_DIR_NAME: &str = "avatar-stage";
const STATE_FILE_NAME: &str = "conversation.json";

/// Everything the orchestrator persists across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    pub system_prompt: String,
    pub voice_params: VoiceParams,
    pub chat_log: Vec<ChatMessage>,

    /// When this snapshot was written; informational only
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            voice_params: VoiceParams::default(),
            chat_log: Vec::new(),
            saved_at: None,
        }
    }
}

/// Default location of the state slot.
pub fn default_state_path() -> Result<PathBuf, String> {
    let dir = dirs::config_dir().ok_or_else(|| "Could not determine config directory".to_string())?;
    Ok(dir.join(STATE_DIR_NAME).join(STATE_FILE_NAME))
}

/// Load the persisted state, falling back to defaults on any problem.
/// A missing file is the normal first-run case and is not logged.
pub fn load_state(path: &Path) -> ConversationState {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<ConversationState>(&contents) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("State store: failed to parse {:?}: {}", path, e);
                ConversationState::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConversationState::default(),
        Err(e) => {
            log::warn!("State store: failed to read {:?}: {}", path, e);
            ConversationState::default()
        }
    }
}

/// Persist the full state snapshot.
pub fn save_state(path: &Path, state: &ConversationState) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create state directory {:?}: {}", parent, e))?;
    }

    let mut stamped = state.clone();
    stamped.saved_at = Some(Utc::now());

    let contents = serde_json::to_string_pretty(&stamped)
        .map_err(|e| format!("Serialize conversation state: {}", e))?;

    // Write atomically: write to a temp file in the same directory, then rename.
    // This prevents a partial/corrupt slot if the process dies mid-write.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp state {:?}: {}", tmp_path, e))?;

    // On Unix, rename will atomically replace the destination. On Windows, rename
    // fails if the destination exists, so we remove it first (ignoring NotFound).
    if cfg!(windows) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(format!("Remove existing state file {:?}: {}", path, e));
                }
            }
        }
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Rename temp state {:?} to {:?}: {}", tmp_path, path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");

        let state = load_state(&path);

        assert_eq!(state.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(state.chat_log.is_empty());
        assert_eq!(state.voice_params, VoiceParams::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");
        std::fs::write(&path, "{ not json").unwrap();

        let state = load_state(&path);

        assert_eq!(state, ConversationState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");

        let mut state = ConversationState::default();
        state.system_prompt = "custom prompt".to_string();
        state.voice_params = VoiceParams {
            speaker_x: 1.0,
            speaker_y: 2.0,
        };
        state.chat_log.push(ChatMessage::user("hello"));
        state.chat_log.push(ChatMessage::assistant("hi there"));

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path);

        assert_eq!(loaded.system_prompt, state.system_prompt);
        assert_eq!(loaded.voice_params, state.voice_params);
        assert_eq!(loaded.chat_log, state.chat_log);
        assert_eq!(loaded.chat_log[1].role, Role::Assistant);
        assert!(loaded.saved_at.is_some());
    }

    #[test]
    fn save_overwrites_previous_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");

        let mut first = ConversationState::default();
        first.chat_log.push(ChatMessage::user("one"));
        save_state(&path, &first).unwrap();

        let mut second = ConversationState::default();
        second.chat_log.push(ChatMessage::user("two"));
        save_state(&path, &second).unwrap();

        let loaded = load_state(&path);
        assert_eq!(loaded.chat_log, second.chat_log);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("conversation.json");

        save_state(&path, &ConversationState::default()).unwrap();

        assert!(path.exists());
    }
}
