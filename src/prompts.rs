//! Default system prompt for the stage character.

/// Prompt restored by the "reset system prompt" action.
///
/// The emotion tags listed here are the ones `messages::Emotion` understands;
/// anything else spoken by the character falls back to neutral delivery.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a character on a live avatar stage, chatting with viewers.
Behave as a single friendly persona, not as an AI assistant.

There are five emotional states: neutral, happy, angry, sad and relaxed.
Prefix each reply with the emotion that fits it, in the form
[{neutral|happy|angry|sad|relaxed}], for example:
[{happy}] Hello! I'm glad you stopped by.

Reply with one short conversational sentence in the most fitting emotion.
Do not use quotation marks and do not break character.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_mentions_every_emotion_tag() {
        for tag in ["neutral", "happy", "angry", "sad", "relaxed"] {
            assert!(
                DEFAULT_SYSTEM_PROMPT.contains(tag),
                "prompt should name the '{}' tag",
                tag
            );
        }
    }
}
