//! Output from runtime execution

use crate::types::ids::{ActionId, NodeId};
use crate::types::text::TextSegment;
use serde::{Deserialize, Serialize};

/// What the presentation layer needs after one step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Output {
    /// Nodes entered during this step, in order
    pub entered: Vec<NodeId>,
    /// Concatenation of the segments revealed so far on the current node
    pub text: String,
    /// Segment to reveal next, if the current node is still revealing
    pub segment: Option<TextSegment>,
    /// Actions on offer when the runtime awaits a choice
    pub actions: Vec<VisibleAction>,
    /// The signal did not belong to the live node visit and was ignored
    pub stale: bool,
    /// The walk has ended
    pub finished: bool,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// An action the player may pick right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisibleAction {
    pub id: ActionId,
    pub label: String,
}
