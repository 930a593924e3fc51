//! Runtime state of a story walk

use crate::types::ids::NodeId;
use crate::types::value::Context;
use serde::{Deserialize, Serialize};

/// Interpreter state: where the walk is and what the context holds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    /// Node currently shown
    pub node_id: NodeId,
    /// Story variables
    pub context: Context,
    /// Whether visible actions are on screen and advancing is parked
    pub awaiting_choice: bool,
    /// Index of the segment being revealed
    pub reveal_index: usize,
    /// Successor chosen by the branch rules when the node was entered
    pub next_id: Option<NodeId>,
    /// Counts node entries, so reveal signals from an earlier visit can be told apart
    pub visit: u64,
    /// The walk reached a node with nothing left to do
    pub finished: bool,
}

impl State {
    /// State positioned on a node that has not been entered yet
    pub fn at(node_id: NodeId, context: Context) -> Self {
        Self {
            node_id,
            context,
            awaiting_choice: false,
            reveal_index: 0,
            next_id: None,
            visit: 0,
            finished: false,
        }
    }

    /// Ticket a presentation layer hands back when the current segment is done
    pub fn ticket(&self) -> RevealTicket {
        RevealTicket {
            node_id: self.node_id.clone(),
            segment: self.reveal_index,
            visit: self.visit,
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }
}

/// Identifies one segment reveal of one node visit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevealTicket {
    pub node_id: NodeId,
    pub segment: usize,
    pub visit: u64,
}
