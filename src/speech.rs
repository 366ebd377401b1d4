//! Speech playback seam.
//!
//! The rendering engine owns animation and viseme playback; from this side
//! speaking is fire-and-forget with two lifecycle callbacks. The trait is
//! the whole contract - the orchestrator never learns more than "playback
//! started" and "playback ended".

use crate::messages::Screenplay;

/// Callback invoked by the renderer at a playback boundary.
pub type PlaybackCallback = Box<dyn FnOnce() + Send + 'static>;

/// Speech playback collaborator.
pub trait SpeechSink: Send + Sync + 'static {
    /// Play one utterance. `on_start` fires when audio begins, `on_end`
    /// when it finishes. Implementations must fire both exactly once.
    fn speak(&self, screenplay: Screenplay, on_start: PlaybackCallback, on_end: PlaybackCallback);
}

/// Headless playback: logs the utterance and fires both callbacks
/// immediately. Used when no renderer is attached and in tests.
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak(&self, screenplay: Screenplay, on_start: PlaybackCallback, on_end: PlaybackCallback) {
        log::info!(
            "speak [{:?}/{}] {}",
            screenplay.expression,
            screenplay.talk.style,
            screenplay.text()
        );
        on_start();
        on_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{texts_to_screenplay, VoiceParams};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn log_speech_fires_both_callbacks() {
        let fired = Arc::new(AtomicU32::new(0));
        let play = texts_to_screenplay(&["hi".to_string()], &VoiceParams::default(), "neutral")
            .remove(0);

        let started = fired.clone();
        let ended = fired.clone();
        LogSpeech.speak(
            play,
            Box::new(move || {
                started.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move || {
                ended.fetch_add(10, Ordering::SeqCst);
            }),
        );

        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }
}
