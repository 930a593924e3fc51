//! Compiled story: the plain, serializable node table handed to the runtime

use crate::error::CompileError;
use crate::types::condition::{BranchRule, Predicate};
use crate::types::effect::Effect;
use crate::types::ids::{ActionId, NodeId};
use crate::types::text::TextSegment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The compiled story artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub root_id: NodeId,
    pub nodes: BTreeMap<NodeId, StoryNode>,
}

/// One dialogue node of the compiled table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: NodeId,
    pub texts: Vec<TextSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<NodeId>,
    #[serde(default)]
    pub rules: Vec<BranchRule>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub actions: Vec<StoryAction>,
}

impl StoryNode {
    /// A node without text routes straight to its successor
    pub fn is_routing(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn action(&self, id: &ActionId) -> Option<&StoryAction> {
        self.actions.iter().find(|action| &action.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Button,
}

/// A player-selectable action of the compiled table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAction {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Predicate>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<NodeId>,
}

impl Story {
    pub fn root(&self) -> Option<&StoryNode> {
        self.nodes.get(&self.root_id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&StoryNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every reference in the table resolves to a node
    pub fn validate(&self) -> Result<(), CompileError> {
        if !self.nodes.contains_key(&self.root_id) {
            return Err(CompileError::MissingRoot {
                root: self.root_id.clone(),
            });
        }

        for (key, node) in &self.nodes {
            if key != &node.id {
                return Err(CompileError::DuplicateNodeId { id: node.id.clone() });
            }

            let mut references: Vec<(&NodeId, String)> = Vec::new();
            if let Some(next) = &node.next_id {
                references.push((next, format!("successor of node '{}'", node.id)));
            }
            for rule in &node.rules {
                references.push((
                    &rule.target_id,
                    format!(
                        "branch rule '{} {} {}' of node '{}'",
                        rule.key, rule.op, rule.value, node.id
                    ),
                ));
            }
            for action in &node.actions {
                if let Some(next) = &action.next_id {
                    references
                        .push((next, format!("action '{}' of node '{}'", action.id, node.id)));
                }
            }

            if let Some((target, origin)) = references
                .into_iter()
                .find(|(target, _)| !self.nodes.contains_key(*target))
            {
                return Err(CompileError::DanglingReference {
                    target: target.clone(),
                    origin,
                });
            }
        }

        Ok(())
    }

    /// md5 of the canonical JSON form, stable across identical compilations
    pub fn digest(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", md5::compute(bytes)))
    }
}
