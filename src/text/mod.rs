//! Text segment compiler
//!
//! Authored text is a list of fragments: literals, pacing directives and
//! ready-made segments. Directives apply to the literal that follows them:
//!
//! ```rust
//! use tsuzuri::text::{TextCompiler, ms, wait};
//! use tsuzuri::script;
//!
//! let compiler = TextCompiler::default();
//! let segments =
//!     compiler.compile(script!["Hello. ", wait(3000), "I did not have time", ms(200), "..."]);
//!
//! assert_eq!(segments.len(), 3);
//! assert_eq!(segments[0].duration, 7 * 50);
//! assert_eq!(segments[1].timeout, 3000);
//! assert_eq!(segments[2].duration, 3 * 200);
//! ```

use crate::config::TextDefaults;
use crate::types::text::TextSegment;

/// Build a `Vec<Fragment>` out of literals, directives and segments
#[macro_export]
macro_rules! script {
    () => {
        ::std::vec::Vec::<$crate::text::Fragment>::new()
    };
    ($($fragment:expr),+ $(,)?) => {
        vec![$($crate::text::Fragment::from($fragment)),+]
    };
}

/// One authored piece of text
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Plain text, paced by the pending directive or the defaults
    Literal(String),
    /// Pacing for the next literal
    Directive(Pace),
    /// A finished segment, taken as is
    Segment(TextSegment),
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::Literal(text.to_string())
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::Literal(text)
    }
}

impl From<Pace> for Fragment {
    fn from(pace: Pace) -> Self {
        Fragment::Directive(pace)
    }
}

impl From<TextSegment> for Fragment {
    fn from(segment: TextSegment) -> Self {
        Fragment::Segment(segment)
    }
}

/// Pacing directive
///
/// `ms` and `duration` exclude each other: setting one clears the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pace {
    ms_per_char: Option<u64>,
    duration: Option<u64>,
    timeout: Option<u64>,
}

impl Pace {
    /// Pause after the segment is revealed
    pub fn wait(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }

    /// Reveal pace per character
    pub fn ms(mut self, ms: u64) -> Self {
        self.ms_per_char = Some(ms);
        self.duration = None;
        self
    }

    /// Total reveal time regardless of length
    pub fn duration(mut self, ms: u64) -> Self {
        self.duration = Some(ms);
        self.ms_per_char = None;
        self
    }

    fn merge(self, later: Pace) -> Self {
        let mut merged = self;
        if let Some(ms) = later.ms_per_char {
            merged = merged.ms(ms);
        }
        if let Some(duration) = later.duration {
            merged = merged.duration(duration);
        }
        if let Some(timeout) = later.timeout {
            merged = merged.wait(timeout);
        }
        merged
    }
}

pub fn wait(ms: u64) -> Pace {
    Pace::default().wait(ms)
}

pub fn ms(ms: u64) -> Pace {
    Pace::default().ms(ms)
}

pub fn duration(ms: u64) -> Pace {
    Pace::default().duration(ms)
}

/// Turns fragments into normalized segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextCompiler {
    defaults: TextDefaults,
}

impl TextCompiler {
    pub fn new(defaults: TextDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &TextDefaults {
        &self.defaults
    }

    pub fn compile<I, F>(&self, fragments: I) -> Vec<TextSegment>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        let mut segments = Vec::new();
        let mut pending: Option<Pace> = None;

        for fragment in fragments {
            match fragment.into() {
                Fragment::Directive(pace) => {
                    pending = Some(pending.map_or(pace, |p| p.merge(pace)));
                }
                Fragment::Literal(text) => {
                    let pace = pending.take().unwrap_or_default();
                    if text.trim().is_empty() {
                        continue;
                    }
                    segments.push(self.paced(text, pace));
                }
                Fragment::Segment(segment) => {
                    if pending.take().is_some() {
                        log::trace!("[Text] Directive before a finished segment ignored");
                    }
                    segments.push(segment);
                }
            }
        }

        if pending.is_some() {
            log::trace!("[Text] Trailing directive without text dropped");
        }

        segments
    }

    /// Segment revealed at the default pace
    pub fn say(&self, text: impl Into<String>) -> TextSegment {
        self.paced(text.into(), Pace::default())
    }

    /// Segment revealed over a fixed duration
    pub fn write(&self, text: impl Into<String>) -> TextSegment {
        self.paced(text.into(), duration(self.defaults.write_duration_ms))
    }

    fn paced(&self, text: String, pace: Pace) -> TextSegment {
        let chars = text.chars().count() as u64;
        let ms_per_char = pace.ms_per_char.unwrap_or(self.defaults.ms_per_char);
        let duration = pace.duration.unwrap_or_else(|| ms_per_char.saturating_mul(chars));
        let timeout = pace.timeout.unwrap_or(self.defaults.timeout_ms);

        TextSegment::new(text, duration, timeout)
    }
}
