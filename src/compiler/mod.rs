//! Flattens a builder graph into the plain node table the runtime walks

use crate::builder::Node;
use crate::builder::context::{ActionKey, BuilderContext, NodeKey};
use crate::error::CompileError;
use crate::types::condition::{BranchRule, Predicate};
use crate::types::ids::NodeId;
use crate::types::story::{ActionKind, Story, StoryAction, StoryNode};
use std::collections::{BTreeMap, HashSet};

/// Compile everything reachable from `root`
///
/// Successors, rule targets and action targets are followed. Actions with
/// text get an auxiliary node (`btn_<action id>`) that shows the text and
/// continues to the action's own successor.
pub fn compile(root: &Node) -> Result<Story, CompileError> {
    let ctx = root.ctx.borrow();
    let mut flattener = Flattener::new(&ctx);
    flattener.run(root.key)?;

    let story = Story {
        root_id: ctx.node(root.key).id.clone(),
        nodes: flattener.nodes,
    };
    story.validate()?;

    match story.digest() {
        Ok(digest) => log::debug!(
            "[Compile] {} nodes from '{}', digest {}",
            story.len(),
            story.root_id,
            digest
        ),
        Err(e) => log::warn!("[Compile] Unable to compute digest: {}", e),
    }

    Ok(story)
}

struct Flattener<'a> {
    ctx: &'a BuilderContext,
    visited: HashSet<NodeKey>,
    emitted: HashSet<ActionKey>,
    nodes: BTreeMap<NodeId, StoryNode>,
}

impl<'a> Flattener<'a> {
    fn new(ctx: &'a BuilderContext) -> Self {
        Self {
            ctx,
            visited: HashSet::new(),
            emitted: HashSet::new(),
            nodes: BTreeMap::new(),
        }
    }

    fn id(&self, key: NodeKey) -> NodeId {
        self.ctx.node(key).id.clone()
    }

    /// Nodes are marked before their neighbours are queued, so cycles terminate
    fn run(&mut self, root: NodeKey) -> Result<(), CompileError> {
        let mut queue = vec![root];
        self.visited.insert(root);

        let ctx = self.ctx;
        while let Some(key) = queue.pop() {
            let data = ctx.node(key);
            let mut neighbours = Vec::new();

            let rules = data
                .rules
                .iter()
                .map(|rule| {
                    neighbours.push(rule.target);
                    BranchRule::new(rule.condition.clone(), self.id(rule.target))
                })
                .collect();

            let mut actions = Vec::with_capacity(data.actions.len());
            for action_key in &data.actions {
                let action = self.flatten_action(*action_key)?;
                actions.push(action);
                if let Some(next) = ctx.action(*action_key).next {
                    neighbours.push(next);
                }
            }

            if let Some(next) = data.next {
                neighbours.push(next);
            }

            self.insert(StoryNode {
                id: data.id.clone(),
                texts: data.texts.clone(),
                next_id: data.next.map(|next| self.id(next)),
                rules,
                effects: data.effects.clone(),
                actions,
            })?;

            // Reverse so the first neighbour is compiled first
            for next in neighbours.into_iter().rev() {
                if self.visited.insert(next) {
                    queue.push(next);
                }
            }
        }

        Ok(())
    }

    fn flatten_action(&mut self, key: ActionKey) -> Result<StoryAction, CompileError> {
        let ctx = self.ctx;
        let data = ctx.action(key);
        let mut next_id = data.next.map(|next| self.id(next));

        if !data.texts.is_empty() {
            let aux_id = data.id.aux_node_id();
            if self.emitted.insert(key) {
                self.insert(StoryNode {
                    id: aux_id.clone(),
                    texts: data.texts.clone(),
                    next_id,
                    rules: Vec::new(),
                    effects: Vec::new(),
                    actions: Vec::new(),
                })?;
            }
            next_id = Some(aux_id);
        }

        let predicate = Predicate {
            and: data.and.clone(),
            or: data.or.clone(),
        };

        Ok(StoryAction {
            id: data.id.clone(),
            kind: ActionKind::Button,
            label: data.label.clone(),
            predicate: (!predicate.is_empty()).then_some(predicate),
            effects: data.effects.clone(),
            next_id,
        })
    }

    fn insert(&mut self, node: StoryNode) -> Result<(), CompileError> {
        if self.nodes.contains_key(&node.id) {
            return Err(CompileError::DuplicateNodeId { id: node.id });
        }
        log::trace!("[Compile] Emitted '{}'", node.id);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }
}
