//! Runtime settings from the environment.
//!
//! All endpoints are overridable via environment variables (a `.env` file
//! is loaded in `main`). The backend and config endpoints are optional;
//! without them the orchestrator still runs, it just logs the gaps.

use std::path::PathBuf;

const DEFAULT_STREAM_URL: &str = "ws://127.0.0.1:8765/stream";

#[derive(Debug, Clone)]
pub struct StageSettings {
    /// Comment relay WebSocket endpoint
    pub stream_url: String,

    /// Conversational backend endpoint; submissions fail softly without it
    pub backend_url: Option<String>,

    /// Configuration service endpoint; defaults are used without it
    pub config_url: Option<String>,

    /// Override for the persisted conversation slot (testing/dev)
    pub state_path: Option<PathBuf>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl StageSettings {
    pub fn from_env() -> Self {
        Self {
            stream_url: env_nonempty("AVATAR_STREAM_URL")
                .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
            backend_url: env_nonempty("AVATAR_CHAT_API_URL"),
            config_url: env_nonempty("AVATAR_CONFIG_URL"),
            state_path: env_nonempty("AVATAR_STATE_FILE").map(PathBuf::from),
        }
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            backend_url: None,
            config_url: None,
            state_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_have_a_stream_url() {
        let settings = StageSettings::default();
        assert!(settings.stream_url.starts_with("ws://"));
        assert!(settings.backend_url.is_none());
    }
}
