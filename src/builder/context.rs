//! Graph assembly context
//!
//! Owns every builder record of one factory: the node and action arenas, the
//! name registry, the deferred links waiting for the build pass and the index
//! of template clones.

use crate::builder::action::Action;
use crate::builder::node::Node;
use crate::config::StoryConfig;
use crate::error::AuthoringError;
use crate::text::TextCompiler;
use crate::types::condition::{Check, Condition};
use crate::types::effect::Effect;
use crate::types::ids::{ActionId, NodeId};
use crate::types::text::TextSegment;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

pub(crate) type Shared = Rc<RefCell<BuilderContext>>;

/// Resolver of a deferred node link
pub type NodeFn = Rc<dyn Fn(Node) -> Result<Node, AuthoringError>>;

/// Resolver that finishes an action in the build pass
pub type ActionFn = Rc<dyn Fn(Action) -> Result<Action, AuthoringError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ActionKey(usize);

#[derive(Debug, Clone)]
pub(crate) struct RuleDraft {
    pub(crate) condition: Condition,
    pub(crate) target: NodeKey,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) texts: Vec<TextSegment>,
    pub(crate) next: Option<NodeKey>,
    pub(crate) prev: Option<NodeKey>,
    pub(crate) rules: Vec<RuleDraft>,
    pub(crate) effects: Vec<Effect>,
    pub(crate) actions: Vec<ActionKey>,
    pub(crate) frozen: bool,
    pub(crate) template: Option<NodeKey>,
}

#[derive(Debug, Clone)]
pub(crate) struct ActionData {
    pub(crate) id: ActionId,
    pub(crate) label: String,
    pub(crate) texts: Vec<TextSegment>,
    pub(crate) and: BTreeMap<String, Check>,
    pub(crate) or: BTreeMap<String, Check>,
    pub(crate) effects: Vec<Effect>,
    pub(crate) next: Option<NodeKey>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) frozen: bool,
}

/// A link whose target is only known once the build pass runs
#[derive(Clone)]
pub(crate) enum PendingEdge {
    /// Resolver returns the successor of `node`
    Successor { node: NodeKey, resolve: NodeFn },
    /// Resolver receives a clone of `node` and returns the rule target
    Branch {
        node: NodeKey,
        condition: Condition,
        resolve: NodeFn,
    },
    /// Resolver returns the chain spliced in after `node`
    Returns { node: NodeKey, resolve: NodeFn },
    /// Resolver finishes the action itself
    ActionBuild { action: ActionKey, resolve: ActionFn },
    /// Resolver receives the action's parent and returns the action's successor
    ActionSuccessor { action: ActionKey, resolve: NodeFn },
}

impl PendingEdge {
    fn node(&self) -> Option<NodeKey> {
        match self {
            PendingEdge::Successor { node, .. }
            | PendingEdge::Branch { node, .. }
            | PendingEdge::Returns { node, .. } => Some(*node),
            PendingEdge::ActionBuild { .. } | PendingEdge::ActionSuccessor { .. } => None,
        }
    }

    fn retarget(&self, clone: NodeKey) -> Self {
        let mut edge = self.clone();
        match &mut edge {
            PendingEdge::Successor { node, .. }
            | PendingEdge::Branch { node, .. }
            | PendingEdge::Returns { node, .. } => *node = clone,
            PendingEdge::ActionBuild { .. } | PendingEdge::ActionSuccessor { .. } => {}
        }
        edge
    }

    fn kind(&self) -> &'static str {
        match self {
            PendingEdge::Successor { .. } => "successor",
            PendingEdge::Branch { .. } => "branch",
            PendingEdge::Returns { .. } => "returns",
            PendingEdge::ActionBuild { .. } => "action",
            PendingEdge::ActionSuccessor { .. } => "action successor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Authoring,
    Resolving,
}

pub(crate) struct BuilderContext {
    pub(crate) config: StoryConfig,
    pub(crate) text: TextCompiler,
    nodes: Vec<NodeData>,
    actions: Vec<ActionData>,
    names: HashMap<String, NodeKey>,
    pending: Vec<PendingEdge>,
    clones: HashMap<NodeKey, Vec<NodeKey>>,
    phase: Phase,
    seq: u32,
}

impl BuilderContext {
    pub(crate) fn new(config: StoryConfig) -> Self {
        Self {
            text: TextCompiler::new(config.text.clone()),
            config,
            nodes: Vec::new(),
            actions: Vec::new(),
            names: HashMap::new(),
            pending: Vec::new(),
            clones: HashMap::new(),
            phase: Phase::Authoring,
            seq: 0,
        }
    }

    fn next_seq(&mut self) -> u32 {
        self.seq += 1;
        self.seq
    }

    pub(crate) fn add_node(&mut self, name: &str) -> NodeKey {
        let seq = self.next_seq();
        let key = NodeKey(self.nodes.len());
        self.nodes.push(NodeData {
            id: NodeId::new(format!("{name}_{seq:04}")),
            name: name.to_string(),
            texts: Vec::new(),
            next: None,
            prev: None,
            rules: Vec::new(),
            effects: Vec::new(),
            actions: Vec::new(),
            frozen: false,
            template: None,
        });
        key
    }

    pub(crate) fn add_action(&mut self, label: &str) -> ActionKey {
        let seq = self.next_seq();
        let key = ActionKey(self.actions.len());
        self.actions.push(ActionData {
            id: ActionId::new(format!("choice_{seq:04}")),
            label: label.to_string(),
            texts: Vec::new(),
            and: BTreeMap::new(),
            or: BTreeMap::new(),
            effects: Vec::new(),
            next: None,
            parent: None,
            frozen: false,
        });
        key
    }

    pub(crate) fn node(&self, key: NodeKey) -> &NodeData {
        &self.nodes[key.0]
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> &mut NodeData {
        &mut self.nodes[key.0]
    }

    pub(crate) fn action(&self, key: ActionKey) -> &ActionData {
        &self.actions[key.0]
    }

    pub(crate) fn action_mut(&mut self, key: ActionKey) -> &mut ActionData {
        &mut self.actions[key.0]
    }

    /// First registration under a name wins
    pub(crate) fn register_name(&mut self, name: &str, key: NodeKey) {
        if let Some(existing) = self.names.get(name) {
            log::debug!(
                "[Build] Name '{}' already taken by '{}', ignoring '{}'",
                name,
                self.node(*existing).id,
                self.node(key).id
            );
            return;
        }
        self.names.insert(name.to_string(), key);
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<NodeKey, AuthoringError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| AuthoringError::UnknownName {
                name: name.to_string(),
            })
    }

    pub(crate) fn defer(&mut self, edge: PendingEdge) -> Result<(), AuthoringError> {
        if self.phase == Phase::Resolving {
            let target = match &edge {
                PendingEdge::ActionBuild { action, .. }
                | PendingEdge::ActionSuccessor { action, .. } => {
                    self.action(*action).id.to_string()
                }
                PendingEdge::Successor { node, .. }
                | PendingEdge::Branch { node, .. }
                | PendingEdge::Returns { node, .. } => self.node(*node).id.to_string(),
            };
            return Err(AuthoringError::NestedContinuation { target });
        }

        log::trace!("[Build] Deferred {} link #{}", edge.kind(), self.pending.len());
        self.pending.push(edge);
        Ok(())
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Hand the pending links to the build pass, which resolves them newest first
    pub(crate) fn begin_resolving(&mut self) -> Vec<PendingEdge> {
        self.phase = Phase::Resolving;
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn end_resolving(&mut self) {
        self.phase = Phase::Authoring;
    }

    pub(crate) fn clones_of(&self, key: NodeKey) -> &[NodeKey] {
        self.clones.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Clone `key` and its successor chain
    ///
    /// Texts, rules and effects are copied, actions are shared. Each node of
    /// the chain is cloned once per call, so a chain that loops back onto
    /// itself produces a loop of clones.
    pub(crate) fn clone_chain(&mut self, key: NodeKey) -> NodeKey {
        let mut cloned = HashMap::new();
        self.clone_node(key, None, &mut cloned)
    }

    fn clone_node(
        &mut self,
        source: NodeKey,
        prev: Option<NodeKey>,
        cloned: &mut HashMap<NodeKey, NodeKey>,
    ) -> NodeKey {
        if let Some(existing) = cloned.get(&source) {
            return *existing;
        }

        let original = self.node(source).clone();
        let name = if original.name.starts_with("clone_") {
            original.name.clone()
        } else {
            format!("clone_{}", original.name)
        };

        let copy = self.add_node(&name);
        {
            let data = self.node_mut(copy);
            data.texts = original.texts;
            data.rules = original.rules;
            data.effects = original.effects;
            data.actions = original.actions;
            data.prev = prev.or(original.prev);
            data.template = Some(source);
        }
        cloned.insert(source, copy);
        self.clones.entry(source).or_default().push(copy);

        if self.phase == Phase::Authoring {
            let inherited: Vec<PendingEdge> = self
                .pending
                .iter()
                .filter(|edge| edge.node() == Some(source))
                .map(|edge| edge.retarget(copy))
                .collect();
            if !inherited.is_empty() {
                log::trace!(
                    "[Build] Clone '{}' inherits {} deferred links",
                    self.node(copy).id,
                    inherited.len()
                );
            }
            self.pending.extend(inherited);
        }

        log::trace!("[Build] Cloned '{}' as '{}'", original.id, self.node(copy).id);

        if let Some(next) = original.next {
            let next_copy = self.clone_node(next, Some(copy), cloned);
            self.node_mut(copy).next = Some(next_copy);
        }

        copy
    }

    /// Mark the chain from `start` onward as frozen
    pub(crate) fn freeze_chain(&mut self, start: NodeKey) {
        let mut seen = HashSet::new();
        let mut cursor = Some(start);
        while let Some(key) = cursor {
            if !seen.insert(key) {
                break;
            }
            self.node_mut(key).frozen = true;
            cursor = self.node(key).next;
        }
    }

    /// Walk predecessors to the start of the chain, or to the first node seen twice
    pub(crate) fn head(&self, start: NodeKey) -> NodeKey {
        self.walk(start, |data| data.prev)
    }

    /// Walk successors to the end of the chain, or to the first node seen twice
    pub(crate) fn tail(&self, start: NodeKey) -> NodeKey {
        self.walk(start, |data| data.next)
    }

    fn walk(&self, start: NodeKey, step: impl Fn(&NodeData) -> Option<NodeKey>) -> NodeKey {
        let mut seen = HashSet::new();
        let mut current = start;
        loop {
            if !seen.insert(current) {
                return current;
            }
            match step(self.node(current)) {
                Some(next) => current = next,
                None => return current,
            }
        }
    }

    /// Last node of the chain from `start`, unless the chain already reaches `stop`
    pub(crate) fn tail_before(&self, start: NodeKey, stop: NodeKey) -> Option<NodeKey> {
        let mut seen = HashSet::new();
        let mut current = start;
        loop {
            if current == stop {
                return None;
            }
            if !seen.insert(current) {
                return Some(current);
            }
            match self.node(current).next {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BuilderContext {
        BuilderContext::new(StoryConfig::default())
    }

    #[test]
    fn ids_are_sequential_and_unique() {
        let mut ctx = context();
        let a = ctx.add_node("root");
        let b = ctx.add_action("Yes");
        let c = ctx.add_node("root");
        assert_eq!(ctx.node(a).id, NodeId::from("root_0001"));
        assert_eq!(ctx.action(b).id, ActionId::from("choice_0002"));
        assert_eq!(ctx.node(c).id, NodeId::from("root_0003"));
    }

    #[test]
    fn first_name_registration_wins() {
        let mut ctx = context();
        let first = ctx.add_node("hub");
        let second = ctx.add_node("hub");
        ctx.register_name("hub", first);
        ctx.register_name("hub", second);
        assert_eq!(ctx.lookup("hub").unwrap(), first);
        assert!(matches!(
            ctx.lookup("nowhere"),
            Err(AuthoringError::UnknownName { .. })
        ));
    }

    #[test]
    fn walks_stop_on_cycles() {
        let mut ctx = context();
        let a = ctx.add_node("a");
        let b = ctx.add_node("b");
        ctx.node_mut(a).next = Some(b);
        ctx.node_mut(b).next = Some(a);
        ctx.node_mut(b).prev = Some(a);
        ctx.node_mut(a).prev = Some(b);

        assert_eq!(ctx.tail(a), a);
        assert_eq!(ctx.head(b), b);
    }

    #[test]
    fn cyclic_chain_clones_into_cyclic_copy() {
        let mut ctx = context();
        let a = ctx.add_node("a");
        let b = ctx.add_node("b");
        ctx.node_mut(a).next = Some(b);
        ctx.node_mut(b).next = Some(a);

        let copy = ctx.clone_chain(a);
        let copy_next = ctx.node(copy).next.unwrap();
        assert_ne!(copy_next, b);
        assert_eq!(ctx.node(copy_next).next, Some(copy));
        assert_eq!(ctx.clones_of(a), &[copy]);
    }

    #[test]
    fn freeze_marks_whole_chain_once() {
        let mut ctx = context();
        let a = ctx.add_node("a");
        let b = ctx.add_node("b");
        ctx.node_mut(a).next = Some(b);
        ctx.node_mut(b).next = Some(a);
        ctx.freeze_chain(a);
        assert!(ctx.node(a).frozen && ctx.node(b).frozen);
    }

    #[test]
    fn tail_before_detects_rejoin() {
        let mut ctx = context();
        let a = ctx.add_node("a");
        let b = ctx.add_node("b");
        let c = ctx.add_node("c");
        ctx.node_mut(a).next = Some(b);
        assert_eq!(ctx.tail_before(a, c), Some(b));
        assert_eq!(ctx.tail_before(a, b), None);
    }
}
