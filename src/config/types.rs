//! Data structures for the stage configuration service.
//!
//! Field naming mirrors the service's mixed convention: top-level keys are
//! snake_case, the character block is camelCase.

use serde::{Deserialize, Serialize};

/// Display/character settings returned by the configuration service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Background image reference; empty keeps the current default
    pub background_url: String,

    #[serde(rename = "characterConfig")]
    pub character: CharacterConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            background_url: String::new(),
            character: CharacterConfig::default(),
        }
    }
}

/// Character-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Name the character goes by on stage
    #[serde(rename = "characterName")]
    pub character_name: String,

    /// Default display name for viewers who don't supply one
    #[serde(rename = "yourName")]
    pub your_name: String,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            character_name: "Avatar".to_string(),
            your_name: "Guest".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_deserialization() {
        let json = r#"{
            "background_url": "/bg/studio.png",
            "characterConfig": {
                "characterName": "Mika",
                "yourName": "Viewer"
            }
        }"#;

        let config: StageConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.background_url, "/bg/studio.png");
        assert_eq!(config.character.character_name, "Mika");
        assert_eq!(config.character.your_name, "Viewer");
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let config: StageConfig = serde_json::from_str("{}").unwrap();

        assert!(config.background_url.is_empty());
        assert_eq!(config.character.your_name, "Guest");
        assert_eq!(config.character.character_name, "Avatar");
    }
}
