//! Chat message and screenplay types.
//!
//! A `Screenplay` is the unit handed to speech playback: one utterance
//! paired with the emotion to express and the voice parameters to speak it
//! with. `texts_to_screenplay` is the only constructor used by the
//! orchestrator and is a pure transformation - no I/O, no failure modes.

use serde::{Deserialize, Serialize};

/// Who said a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation log. Immutable once appended, except for
/// the explicit single-index edit the orchestrator exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Voice-synthesis parameters for the character voice.
///
/// The two axes position the voice in the synthesizer's speaker space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    pub speaker_x: f32,
    pub speaker_y: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            speaker_x: 3.0,
            speaker_y: 3.0,
        }
    }
}

/// Emotion expressed by the avatar while an utterance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Angry,
    Sad,
    Relaxed,
}

impl Emotion {
    /// Parse an emotion tag from the wire. Unknown or empty tags fall back
    /// to neutral rather than failing.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "happy" => Emotion::Happy,
            "angry" => Emotion::Angry,
            "sad" => Emotion::Sad,
            "relaxed" => Emotion::Relaxed,
            _ => Emotion::Neutral,
        }
    }

    /// Speaking style understood by the voice synthesizer. Only happy and
    /// sad have dedicated styles; everything else uses plain talk.
    pub fn talk_style(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            _ => "talk",
        }
    }
}

/// The spoken half of a screenplay: what to say and how to voice it.
#[derive(Debug, Clone, PartialEq)]
pub struct Talk {
    pub style: &'static str,
    pub speaker_x: f32,
    pub speaker_y: f32,
    pub message: String,
}

/// One utterance ready for speech playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenplay {
    pub expression: Emotion,
    pub talk: Talk,
}

impl Screenplay {
    pub fn text(&self) -> &str {
        &self.talk.message
    }
}

/// Build one screenplay per input segment, preserving order.
///
/// The caller guarantees the segments are non-empty; empty strings pass
/// through untouched rather than being filtered here.
pub fn texts_to_screenplay(
    texts: &[String],
    params: &VoiceParams,
    emotion_tag: &str,
) -> Vec<Screenplay> {
    let expression = Emotion::from_tag(emotion_tag);
    texts
        .iter()
        .map(|text| Screenplay {
            expression,
            talk: Talk {
                style: expression.talk_style(),
                speaker_x: params.speaker_x,
                speaker_y: params.speaker_y,
                message: text.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_screenplay_per_segment_in_order() {
        let texts = vec!["first".to_string(), "second".to_string()];
        let plays = texts_to_screenplay(&texts, &VoiceParams::default(), "happy");

        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].text(), "first");
        assert_eq!(plays[1].text(), "second");
    }

    #[test]
    fn emotion_tag_carries_into_every_screenplay() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let plays = texts_to_screenplay(&texts, &VoiceParams::default(), "sad");

        assert!(plays.iter().all(|p| p.expression == Emotion::Sad));
        assert!(plays.iter().all(|p| p.talk.style == "sad"));
    }

    #[test]
    fn unknown_emotion_tag_falls_back_to_neutral() {
        assert_eq!(Emotion::from_tag("confused"), Emotion::Neutral);
        assert_eq!(Emotion::from_tag(""), Emotion::Neutral);
        assert_eq!(Emotion::from_tag("  HAPPY "), Emotion::Happy);
    }

    #[test]
    fn talk_style_maps_happy_and_sad_only() {
        assert_eq!(Emotion::Happy.talk_style(), "happy");
        assert_eq!(Emotion::Sad.talk_style(), "sad");
        assert_eq!(Emotion::Angry.talk_style(), "talk");
        assert_eq!(Emotion::Neutral.talk_style(), "talk");
        assert_eq!(Emotion::Relaxed.talk_style(), "talk");
    }

    #[test]
    fn voice_params_flow_into_talk() {
        let params = VoiceParams {
            speaker_x: 1.5,
            speaker_y: -2.0,
        };
        let plays = texts_to_screenplay(&["hi".to_string()], &params, "neutral");

        assert_eq!(plays[0].talk.speaker_x, 1.5);
        assert_eq!(plays[0].talk.speaker_y, -2.0);
    }

    #[test]
    fn voice_params_serde_round_trip() {
        let params = VoiceParams {
            speaker_x: 0.5,
            speaker_y: 7.0,
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: VoiceParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn chat_message_serde_uses_lowercase_roles() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));

        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
