//! Effect runner for the avatar stage
//!
//! This module handles executing effects produced by the state machine:
//! opening stream connections, calling the conversational backend, handing
//! utterances to speech playback, arming the subtitle countdown, and
//! persisting conversation snapshots. Completion events are sent back to
//! the state loop via the provided channel.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::chat;
use crate::config::fetch_stage_config;
use crate::settings::StageSettings;
use crate::speech::SpeechSink;
use crate::state_machine::{Effect, Event};
use crate::store::save_state;
use crate::stream::StreamSession;

/// Trait for running effects asynchronously.
/// Completion events are sent back via the provided channel.
pub trait EffectRunner: Send + Sync + 'static {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>);
}

/// Real effect runner wired to the live collaborators: the comment relay,
/// the conversational backend, the config service, speech playback and the
/// persisted state slot.
pub struct LiveEffectRunner {
    settings: StageSettings,
    state_path: Option<PathBuf>,
    speech: Arc<dyn SpeechSink>,
}

impl LiveEffectRunner {
    pub fn new(
        settings: StageSettings,
        state_path: Option<PathBuf>,
        speech: Arc<dyn SpeechSink>,
    ) -> Arc<Self> {
        if state_path.is_none() {
            log::warn!("no state path available; conversation will not persist");
        }
        Arc::new(Self {
            settings,
            state_path,
            speech,
        })
    }
}

impl EffectRunner for LiveEffectRunner {
    fn spawn(&self, effect: Effect, tx: mpsc::Sender<Event>) {
        match effect {
            Effect::FetchConfig => {
                let url = self.settings.config_url.clone();
                tokio::spawn(async move {
                    let url = match url {
                        Some(url) => url,
                        None => {
                            log::info!("no config service configured; using defaults");
                            return;
                        }
                    };
                    let event = match fetch_stage_config(&url).await {
                        Ok(config) => Event::ConfigLoaded(config),
                        Err(err) => Event::ConfigFailed { err },
                    };
                    let _ = tx.send(event).await;
                });
            }

            Effect::OpenStream { delay } => {
                let url = self.settings.stream_url.clone();
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    match StreamSession::connect(&url).await {
                        Ok(mut session) => {
                            let _ = tx
                                .send(Event::LinkUp {
                                    session_id: session.session_id(),
                                })
                                .await;
                            // Frames arrive in order; forward them in order.
                            while let Some(frame) = session.recv().await {
                                if tx.send(Event::Inbound(frame.message)).await.is_err() {
                                    return;
                                }
                            }
                            let _ = tx
                                .send(Event::LinkDown {
                                    reason: "connection closed".to_string(),
                                })
                                .await;
                        }
                        Err(e) => {
                            let _ = tx.send(Event::LinkFail { err: e.to_string() }).await;
                        }
                    }
                });
            }

            Effect::Speak { screenplay, caption } => {
                // Fire-and-forget: the renderer invokes the callbacks at
                // playback boundaries, from whatever thread it likes.
                let start_tx = tx.clone();
                let end_tx = tx;
                self.speech.speak(
                    screenplay,
                    Box::new(move || {
                        if let Err(e) = start_tx.try_send(Event::SpeechStarted { caption }) {
                            log::warn!("dropping playback start event: {}", e);
                        }
                    }),
                    Box::new(move || {
                        if let Err(e) = end_tx.try_send(Event::SpeechEnded) {
                            log::warn!("dropping playback end event: {}", e);
                        }
                    }),
                );
            }

            Effect::CallBackend {
                generation,
                content,
                speaker_name,
            } => {
                let endpoint = self.settings.backend_url.clone();
                tokio::spawn(async move {
                    let outcome = chat::send_chat(endpoint.as_deref(), &content, &speaker_name)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx
                        .send(Event::BackendSettled {
                            generation,
                            outcome,
                        })
                        .await;
                });
            }

            Effect::Persist { snapshot } => {
                let path = match &self.state_path {
                    Some(path) => path.clone(),
                    None => {
                        log::debug!("skipping persist; no state path");
                        return;
                    }
                };
                tokio::spawn(async move {
                    if let Err(e) = save_state(&path, &snapshot) {
                        log::error!("failed to persist conversation state: {}", e);
                    }
                });
            }

            Effect::StartSubtitleClear { epoch, delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::SubtitleExpired { epoch }).await;
                });
            }

            // EmitUi is routed by the state loop, not the runner
            Effect::EmitUi => {
                log::debug!("EmitUi reached the effect runner; ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::LogSpeech;
    use std::time::Duration;

    fn test_runner(settings: StageSettings) -> Arc<LiveEffectRunner> {
        LiveEffectRunner::new(settings, None, Arc::new(LogSpeech))
    }

    #[tokio::test]
    async fn backend_call_without_endpoint_settles_with_error() {
        let runner = test_runner(StageSettings::default());
        let (tx, mut rx) = mpsc::channel(8);

        runner.spawn(
            Effect::CallBackend {
                generation: 7,
                content: "hi".to_string(),
                speaker_name: "Alice".to_string(),
            },
            tx,
        );

        match rx.recv().await {
            Some(Event::BackendSettled {
                generation,
                outcome,
            }) => {
                assert_eq!(generation, 7);
                assert!(outcome.is_err());
            }
            other => panic!("expected BackendSettled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn subtitle_clear_fires_after_delay() {
        let runner = test_runner(StageSettings::default());
        let (tx, mut rx) = mpsc::channel(8);

        runner.spawn(
            Effect::StartSubtitleClear {
                epoch: 3,
                delay: Duration::from_millis(10),
            },
            tx,
        );

        match rx.recv().await {
            Some(Event::SubtitleExpired { epoch }) => assert_eq!(epoch, 3),
            other => panic!("expected SubtitleExpired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn speak_reports_playback_boundaries_in_order() {
        let runner = test_runner(StageSettings::default());
        let (tx, mut rx) = mpsc::channel(8);

        let screenplay = crate::messages::texts_to_screenplay(
            &["hello".to_string()],
            &crate::messages::VoiceParams::default(),
            "happy",
        )
        .remove(0);

        runner.spawn(
            Effect::Speak {
                screenplay,
                caption: "hello".to_string(),
            },
            tx,
        );

        match rx.recv().await {
            Some(Event::SpeechStarted { caption }) => assert_eq!(caption, "hello"),
            other => panic!("expected SpeechStarted, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(Event::SpeechEnded)));
    }

    #[tokio::test]
    async fn failed_connect_reports_link_fail() {
        let settings = StageSettings {
            stream_url: "ws://127.0.0.1:9/stream".to_string(),
            ..StageSettings::default()
        };
        let runner = test_runner(settings);
        let (tx, mut rx) = mpsc::channel(8);

        runner.spawn(
            Effect::OpenStream {
                delay: Duration::ZERO,
            },
            tx,
        );

        match rx.recv().await {
            Some(Event::LinkFail { .. }) => {}
            other => panic!("expected LinkFail, got {:?}", other),
        }
    }
}
