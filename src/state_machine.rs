//! State machine for the avatar stage orchestrator
//!
//! This module implements the orchestration core using a single-writer
//! pattern. All state transitions go through the `reduce()` function, which
//! returns a new state and a list of effects to execute.

use std::time::Duration;
use uuid::Uuid;

use crate::config::StageConfig;
use crate::messages::{texts_to_screenplay, ChatMessage, Screenplay, VoiceParams};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::store::ConversationState;
use crate::stream::protocol::InboundEvent;
use crate::subtitle::SubtitleState;

/// How long a subtitle chunk stays on screen before auto-clearing
pub const SUBTITLE_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// Base delay for reconnect backoff (doubles per consecutive failure)
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for reconnect backoff
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Delay before the next connection attempt.
///
/// A drop after a healthy session reconnects immediately; consecutive
/// establishment failures back off exponentially up to the ceiling.
pub fn reconnect_delay(failed_attempts: u32) -> Duration {
    if failed_attempts == 0 {
        return Duration::ZERO;
    }
    let exp = failed_attempts.saturating_sub(1).min(5);
    let delay = RECONNECT_BASE_DELAY * 2u32.pow(exp);
    delay.min(RECONNECT_MAX_DELAY)
}

/// Connection state of the comment stream link.
/// Exactly one establishment attempt is in flight while `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Offline,
    Connecting,
    Online,
}

/// Internal state of the stage.
/// This is the authoritative state - all transitions go through the reducer.
#[derive(Debug, Clone)]
pub struct State {
    /// Startup guard: `Start` runs at most once per process
    pub started: bool,
    pub link: Link,
    /// Consecutive failed establishment attempts, drives backoff
    pub failed_attempts: u32,

    pub conversation: ConversationState,
    /// True while a submission is in flight to the backend
    pub processing: bool,
    /// Bumped on chat-log reset; stale backend settles are discarded
    pub generation: u64,

    /// Assistant message display value shown beside the avatar
    pub assistant_message: String,
    pub subtitle: SubtitleState,
    /// Bumped on every subtitle `show`; only the matching expiry clears
    pub subtitle_epoch: u64,

    /// Fallback display name for viewers who don't supply one
    pub default_speaker: String,
    /// Background image reference from the config service
    pub background_url: Option<String>,
}

impl State {
    pub fn with_conversation(conversation: ConversationState) -> Self {
        Self {
            conversation,
            ..Self::default()
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self {
            started: false,
            link: Link::Offline,
            failed_attempts: 0,
            conversation: ConversationState::default(),
            processing: false,
            generation: 0,
            assistant_message: String::new(),
            subtitle: SubtitleState::new(),
            subtitle_epoch: 0,
            default_speaker: crate::config::CharacterConfig::default().your_name,
            background_url: None,
        }
    }
}

/// Events that can trigger state transitions.
/// These are sent from various sources: stream pump, effect tasks, the UI
/// layer's mutator callbacks, timers.
#[derive(Debug, Clone)]
pub enum Event {
    /// Bring the stage up: fetch config, open the stream. At most once.
    Start,
    /// Application exit requested
    Exit,

    // Config service events
    ConfigLoaded(StageConfig),
    ConfigFailed {
        err: String,
    },

    // Link events
    LinkUp {
        session_id: Uuid,
    },
    LinkDown {
        reason: String,
    },
    LinkFail {
        err: String,
    },

    /// Parsed event from the comment stream
    Inbound(InboundEvent),

    // Playback lifecycle (from the renderer's callbacks)
    SpeechStarted {
        caption: String,
    },
    SpeechEnded,

    /// Subtitle auto-clear countdown elapsed (epoch prevents stale clears)
    SubtitleExpired {
        epoch: u64,
    },

    // Outbound chat
    Submit {
        speaker_name: String,
        content: String,
    },
    BackendSettled {
        generation: u64,
        outcome: Result<(), String>,
    },

    // UI mutator callbacks
    EditChatMessage {
        index: usize,
        text: String,
    },
    SetSystemPrompt {
        prompt: String,
    },
    SetVoiceParams {
        params: VoiceParams,
    },
    ResetChatLog,
    ResetSystemPrompt,
}

/// Effects to be executed after a state transition.
/// The effect runner handles these asynchronously.
#[derive(Debug, Clone)]
pub enum Effect {
    FetchConfig,
    /// Open one stream connection after `delay`; exactly one is ever
    /// issued per closure or failure
    OpenStream {
        delay: Duration,
    },
    /// Hand one utterance to speech playback
    Speak {
        screenplay: Screenplay,
        caption: String,
    },
    CallBackend {
        generation: u64,
        content: String,
        speaker_name: String,
    },
    /// Write the full conversation snapshot; later writes supersede
    Persist {
        snapshot: ConversationState,
    },
    StartSubtitleClear {
        epoch: u64,
        delay: Duration,
    },
    /// Signal to publish a fresh view snapshot to the UI layer
    EmitUi,
}

/// Reducer function: (state, event) -> (next_state, effects)
///
/// Key rules:
/// - Never mutate state in place; callers keep the returned state
/// - Ignore events carrying a stale generation or subtitle epoch
/// - Emit EmitUi after every observable change
pub fn reduce(state: &State, event: Event) -> (State, Vec<Effect>) {
    use Effect::*;
    use Event::*;

    let mut next = state.clone();

    match event {
        // -----------------
        // Startup
        // -----------------
        Start => {
            if state.started {
                log::debug!("ignoring duplicate Start");
                return (next, vec![]);
            }
            next.started = true;
            next.link = Link::Connecting;
            (
                next,
                vec![
                    FetchConfig,
                    OpenStream {
                        delay: Duration::ZERO,
                    },
                    EmitUi,
                ],
            )
        }

        // Exit is handled at the loop edge; nothing to do here
        Exit => (next, vec![]),

        // -----------------
        // Config service
        // -----------------
        ConfigLoaded(config) => {
            if !config.character.your_name.is_empty() {
                next.default_speaker = config.character.your_name;
            }
            if !config.background_url.is_empty() {
                next.background_url = Some(config.background_url);
            }
            (next, vec![EmitUi])
        }
        ConfigFailed { err } => {
            log::warn!("stage config fetch failed, keeping defaults: {}", err);
            (next, vec![])
        }

        // -----------------
        // Link supervision
        // -----------------
        LinkUp { session_id } => match state.link {
            Link::Connecting => {
                log::info!("comment stream online (session {})", session_id);
                next.link = Link::Online;
                next.failed_attempts = 0;
                (next, vec![EmitUi])
            }
            _ => {
                log::warn!("unexpected LinkUp in {:?}, ignoring", state.link);
                (next, vec![])
            }
        },
        LinkDown { reason } => match state.link {
            Link::Online => {
                log::info!("comment stream closed ({}), reconnecting", reason);
                next.link = Link::Connecting;
                let delay = reconnect_delay(state.failed_attempts);
                (next, vec![OpenStream { delay }, EmitUi])
            }
            // An attempt is already in flight or the stage never started;
            // opening another would overlap it
            _ => {
                log::debug!("stale LinkDown in {:?}, ignoring", state.link);
                (next, vec![])
            }
        },
        LinkFail { err } => match state.link {
            Link::Connecting => {
                next.failed_attempts = state.failed_attempts + 1;
                let delay = reconnect_delay(next.failed_attempts);
                log::warn!(
                    "stream connect failed (attempt {}): {}; retrying in {:?}",
                    next.failed_attempts,
                    err,
                    delay
                );
                (next, vec![OpenStream { delay }])
            }
            _ => {
                log::debug!("stale LinkFail in {:?}, ignoring", state.link);
                (next, vec![])
            }
        },

        // -----------------
        // Inbound path
        // -----------------
        Inbound(inbound) => {
            if !inbound.is_user() {
                // Other kinds are relay chatter; dropped silently
                return (next, vec![]);
            }
            if !inbound.has_content() {
                return (next, vec![]);
            }

            log::debug!(
                "stage message from '{}' [{}]: {}",
                inbound.user_name,
                inbound.emote,
                inbound.content
            );

            let screenplays = texts_to_screenplay(
                &[inbound.content.clone()],
                &state.conversation.voice_params,
                &inbound.emote,
            );
            let screenplay = screenplays
                .into_iter()
                .next()
                .expect("one segment in, one screenplay out");

            // The accumulator restarts at the new utterance; the playback
            // start callback appends the displayed chunk on top of it.
            next.subtitle.replace_accumulated(&inbound.content);

            (
                next,
                vec![
                    Speak {
                        screenplay,
                        caption: inbound.content,
                    },
                    EmitUi,
                ],
            )
        }

        // -----------------
        // Playback lifecycle
        // -----------------
        SpeechStarted { caption } => {
            // The joined-sentence buffer is empty until streaming replies
            // land; the display value mirrors it faithfully.
            next.assistant_message = String::new();
            next.subtitle.show(&format!("{} ", caption));
            next.subtitle_epoch = state.subtitle_epoch + 1;
            (
                next,
                vec![
                    StartSubtitleClear {
                        epoch: state.subtitle_epoch + 1,
                        delay: SUBTITLE_CLEAR_DELAY,
                    },
                    EmitUi,
                ],
            )
        }
        SpeechEnded => {
            log::debug!("speech playback ended");
            (next, vec![])
        }

        // Only clear for the countdown armed by the latest show
        SubtitleExpired { epoch } => {
            if epoch != state.subtitle_epoch {
                return (next, vec![]);
            }
            next.subtitle.clear();
            (next, vec![EmitUi])
        }

        // -----------------
        // Outbound path
        // -----------------
        Submit {
            speaker_name,
            content,
        } => {
            next.processing = true;
            next.conversation
                .chat_log
                .push(ChatMessage::user(content.clone()));

            let speaker_name = if speaker_name.trim().is_empty() {
                state.default_speaker.clone()
            } else {
                speaker_name
            };

            let snapshot = next.conversation.clone();
            (
                next,
                vec![
                    CallBackend {
                        generation: state.generation,
                        content,
                        speaker_name,
                    },
                    Persist { snapshot },
                    EmitUi,
                ],
            )
        }
        BackendSettled {
            generation,
            outcome,
        } => {
            if generation != state.generation {
                log::debug!("dropping stale backend settle (generation {})", generation);
                return (next, vec![]);
            }
            next.processing = false;
            if let Err(e) = outcome {
                // Swallowed: the viewer sees no error, the stage stays live
                log::error!("chat backend call failed: {}", e);
            }
            (next, vec![EmitUi])
        }

        // -----------------
        // Conversation mutators
        // -----------------
        EditChatMessage { index, text } => {
            match next.conversation.chat_log.get_mut(index) {
                Some(message) => message.content = text,
                None => {
                    log::warn!("edit for out-of-range chat index {}", index);
                    return (next, vec![]);
                }
            }
            let snapshot = next.conversation.clone();
            (next, vec![Persist { snapshot }, EmitUi])
        }
        SetSystemPrompt { prompt } => {
            next.conversation.system_prompt = prompt;
            let snapshot = next.conversation.clone();
            (next, vec![Persist { snapshot }, EmitUi])
        }
        SetVoiceParams { params } => {
            next.conversation.voice_params = params;
            let snapshot = next.conversation.clone();
            (next, vec![Persist { snapshot }, EmitUi])
        }
        ResetChatLog => {
            next.conversation.chat_log.clear();
            // In-flight submissions now answer a conversation that no
            // longer exists; their settles must not touch the new one
            next.generation = state.generation + 1;
            next.processing = false;
            let snapshot = next.conversation.clone();
            (next, vec![Persist { snapshot }, EmitUi])
        }
        ResetSystemPrompt => {
            next.conversation.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
            let snapshot = next.conversation.clone();
            (next, vec![Persist { snapshot }, EmitUi])
        }
    }
}
