//! Debug logging for story execution
//!
//! Runtime messages go through the `log` facade with a per-category target
//! (`tsuzuri::runtime::flow`, ...), so any logger installed by the host
//! decides where they end up. `DebugConfig` filters them before that.

use crate::runtime::visible_actions;
use crate::types::state::State;
use crate::types::story::Story;
use crate::types::value::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Debug log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// All internal state changes
    Trace,
    /// Development debugging information
    Debug,
    /// Important state changes
    Info,
    /// Potential issues
    Warn,
    /// Error situations
    Error,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Debug log category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugCategory {
    /// Node entry and step handling
    Engine,
    /// Effects applied to the context
    Context,
    /// Branch rules, successors, choices
    Flow,
    /// Segment reveal signals
    Reveal,
}

impl DebugCategory {
    pub fn target(self) -> &'static str {
        match self {
            DebugCategory::Engine => "tsuzuri::runtime::engine",
            DebugCategory::Context => "tsuzuri::runtime::context",
            DebugCategory::Flow => "tsuzuri::runtime::flow",
            DebugCategory::Reveal => "tsuzuri::runtime::reveal",
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Enable debug logging
    pub enabled: bool,
    /// Minimum log level
    pub level: LogLevel,
    /// Enabled categories
    pub categories: HashSet<DebugCategory>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        let mut categories = HashSet::new();
        categories.insert(DebugCategory::Engine);
        categories.insert(DebugCategory::Flow);

        Self {
            enabled: std::env::var("TSUZURI_DEBUG").is_ok(),
            level: LogLevel::Debug,
            categories,
        }
    }
}

impl DebugConfig {
    /// Everything, down to trace
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Trace,
            categories: [
                DebugCategory::Engine,
                DebugCategory::Context,
                DebugCategory::Flow,
                DebugCategory::Reveal,
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn allows(&self, category: DebugCategory, level: LogLevel) -> bool {
        self.enabled && level >= self.level && self.categories.contains(&category)
    }
}

/// Debug snapshot of the interpreter state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugSnapshot {
    pub node_id: String,
    pub reveal_index: usize,
    pub segments: usize,
    pub context: Context,
    pub awaiting_choice: bool,
    pub visible_actions: Vec<String>,
    pub next_id: Option<String>,
}

impl DebugSnapshot {
    pub fn capture(story: &Story, state: &State) -> Self {
        Self {
            node_id: state.node_id.to_string(),
            reveal_index: state.reveal_index,
            segments: story
                .node(&state.node_id)
                .map(|node| node.texts.len())
                .unwrap_or(0),
            context: state.context.clone(),
            awaiting_choice: state.awaiting_choice,
            visible_actions: visible_actions(story, state)
                .into_iter()
                .map(|action| action.label)
                .collect(),
            next_id: state.next_id.as_ref().map(ToString::to_string),
        }
    }
}

/// Log a debug message
pub fn log(config: &DebugConfig, category: DebugCategory, level: LogLevel, message: &str) {
    if !config.allows(category, level) {
        return;
    }
    log::log!(target: category.target(), level.into(), "{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_config_default() {
        let config = DebugConfig::default();
        assert!(!config.enabled || std::env::var("TSUZURI_DEBUG").is_ok());
        assert!(config.categories.contains(&DebugCategory::Engine));
        assert!(!config.categories.contains(&DebugCategory::Context));
    }

    #[test]
    fn filtering_by_level_and_category() {
        let mut config = DebugConfig::default();
        config.enabled = true;
        config.level = LogLevel::Info;

        assert!(config.allows(DebugCategory::Flow, LogLevel::Warn));
        assert!(!config.allows(DebugCategory::Flow, LogLevel::Debug));
        assert!(!config.allows(DebugCategory::Reveal, LogLevel::Error));

        config.enabled = false;
        assert!(!config.allows(DebugCategory::Flow, LogLevel::Error));
    }

    #[test]
    fn verbose_enables_everything() {
        let config = DebugConfig::verbose();
        assert!(config.allows(DebugCategory::Context, LogLevel::Trace));
        assert!(config.allows(DebugCategory::Reveal, LogLevel::Trace));
    }

    #[test]
    fn debug_log_output() {
        // Without a logger installed this is a no-op
        log(
            &DebugConfig::verbose(),
            DebugCategory::Engine,
            LogLevel::Debug,
            "Test message",
        );
    }
}
