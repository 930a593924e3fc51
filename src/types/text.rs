//! Timed text segment

use serde::{Deserialize, Serialize};

/// One piece of text revealed over `duration` ms, followed by a `timeout` ms pause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub duration: u64,
    pub timeout: u64,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, duration: u64, timeout: u64) -> Self {
        Self {
            text: text.into(),
            duration,
            timeout,
        }
    }

    /// Milliseconds per revealed character
    pub fn ms_per_char(&self) -> u64 {
        let chars = self.text.chars().count() as u64;
        if chars == 0 { 0 } else { self.duration / chars }
    }
}
