pub mod chat;
pub mod config;
pub mod effects;
pub mod messages;
pub mod prompts;
pub mod settings;
pub mod speech;
pub mod state_machine;
pub mod store;
pub mod stream;
pub mod subtitle;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use effects::{EffectRunner, LiveEffectRunner};
use messages::ChatMessage;
use settings::StageSettings;
use speech::{LogSpeech, SpeechSink};
use state_machine::{reduce, Effect, Event, Link, State};

/// View of the stage published to the UI layer on every state change.
/// The UI never touches `State` directly; it reads snapshots and sends
/// mutator events through the handle.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub connected: bool,
    pub processing: bool,
    pub assistant_message: String,
    pub subtitle: String,
    pub displayed_subtitle: String,
    pub chat_log: Vec<ChatMessage>,
    pub background_url: Option<String>,
}

/// Convert internal State to the UI-facing snapshot
fn state_to_view(state: &State) -> StageView {
    StageView {
        connected: state.link == Link::Online,
        processing: state.processing,
        assistant_message: state.assistant_message.clone(),
        subtitle: state.subtitle.accumulated().to_string(),
        displayed_subtitle: state.subtitle.displayed().to_string(),
        chat_log: state.conversation.chat_log.clone(),
        background_url: state.background_url.clone(),
    }
}

/// State loop handle - holds the event sender for dispatching events
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<Event>,
}

impl OrchestratorHandle {
    /// Send an event to the state machine
    pub async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.tx.send(event).await
    }
}

/// Run the main state loop
pub async fn run_event_loop(
    mut rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    effect_runner: Arc<dyn EffectRunner>,
    view_tx: watch::Sender<StageView>,
    initial: State,
) {
    let mut state = initial;

    // Publish the initial view
    let _ = view_tx.send(state_to_view(&state));
    log::info!("state loop started");

    while let Some(event) = rx.recv().await {
        log::debug!("received event: {:?}", event);

        // Handle Exit at the edge
        if matches!(event, Event::Exit) {
            log::info!("exit requested, shutting down state loop");
            break;
        }

        let old_link = state.link;
        let (next, effects) = reduce(&state, event);

        if old_link != next.link {
            log::info!("link transition: {:?} -> {:?}", old_link, next.link);
        }

        state = next;

        // Execute effects
        for eff in effects {
            match eff {
                Effect::EmitUi => {
                    let _ = view_tx.send(state_to_view(&state));
                }
                other => effect_runner.spawn(other, tx.clone()),
            }
        }
    }

    log::info!("state loop ended");
}

/// A running stage: the handle for sending events, the view channel the
/// UI layer watches, and the loop task itself.
pub struct Stage {
    pub handle: OrchestratorHandle,
    pub view: watch::Receiver<StageView>,
    pub loop_task: tokio::task::JoinHandle<()>,
}

/// Wire up and start the orchestrator against the given collaborators.
///
/// Loads the persisted conversation, spawns the state loop and sends the
/// one-time `Start` event. Dropping the returned `Stage` does not stop the
/// loop; send `Event::Exit` for a clean shutdown.
pub async fn start_stage(settings: StageSettings, speech: Arc<dyn SpeechSink>) -> Stage {
    let state_path = settings.state_path.clone().or_else(|| {
        store::default_state_path()
            .map_err(|e| log::warn!("state store unavailable: {}", e))
            .ok()
    });

    let conversation = state_path
        .as_deref()
        .map(store::load_state)
        .unwrap_or_default();
    log::info!(
        "loaded conversation: {} message(s)",
        conversation.chat_log.len()
    );

    let initial = State::with_conversation(conversation);
    let (view_tx, view_rx) = watch::channel(state_to_view(&initial));

    // Create event channel for the state machine
    let (tx, rx) = mpsc::channel::<Event>(32);
    let handle = OrchestratorHandle { tx: tx.clone() };

    let effect_runner = LiveEffectRunner::new(settings, state_path, speech);

    let tx_for_loop = tx.clone();
    let loop_task = tokio::spawn(async move {
        run_event_loop(rx, tx_for_loop, effect_runner, view_tx, initial).await;
    });

    if handle.send(Event::Start).await.is_err() {
        log::error!("state loop rejected Start event");
    }

    Stage {
        handle,
        view: view_rx,
        loop_task,
    }
}

/// Application entry point for the headless binary: environment settings,
/// logging playback, run until the loop ends.
pub async fn run() {
    let settings = StageSettings::from_env();
    log::info!("avatar stage starting; stream at {}", settings.stream_url);

    let stage = start_stage(settings, Arc::new(LogSpeech)).await;

    if let Err(e) = stage.loop_task.await {
        log::error!("state loop task failed: {}", e);
    }
}
