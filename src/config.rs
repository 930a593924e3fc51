//! Builder configuration

use serde::{Deserialize, Serialize};

/// What a mutator does when it is called on a frozen node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezePolicy {
    /// Clone the frozen node (and its successor chain) and mutate the clone
    #[default]
    CloneOnWrite,
    /// Refuse with `AuthoringError::Frozen`
    Strict,
}

/// Story builder configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Frozen node handling
    pub freeze_policy: FreezePolicy,
    /// Text pacing defaults
    pub text: TextDefaults,
}

impl StoryConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Text pacing defaults used by the text compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDefaults {
    /// Reveal pace in milliseconds per character
    pub ms_per_char: u64,
    /// Pause after a segment is fully revealed
    pub timeout_ms: u64,
    /// Duration of segments made with `write`
    pub write_duration_ms: u64,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            ms_per_char: 50,
            timeout_ms: 500,
            write_duration_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reveal_pacing() {
        let config = StoryConfig::default();
        assert_eq!(config.freeze_policy, FreezePolicy::CloneOnWrite);
        assert_eq!(config.text.ms_per_char, 50);
        assert_eq!(config.text.timeout_ms, 500);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            StoryConfig::from_json(r#"{"freeze_policy": "strict", "text": {"timeout_ms": 800}}"#)
                .unwrap();
        assert_eq!(config.freeze_policy, FreezePolicy::Strict);
        assert_eq!(config.text.timeout_ms, 800);
        assert_eq!(config.text.ms_per_char, 50);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(StoryConfig::from_json("{ not json").is_err());
    }
}
