//! Node builder: one dialogue node under construction

use crate::builder::Link;
use crate::builder::action::Action;
use crate::builder::context::{NodeKey, PendingEdge, RuleDraft, Shared};
use crate::config::FreezePolicy;
use crate::error::AuthoringError;
use crate::text::Fragment;
use crate::types::condition::{Condition, IntoOperator};
use crate::types::effect::Effect;
use crate::types::ids::NodeId;
use crate::types::text::TextSegment;
use serde_json::Value;
use std::rc::Rc;

/// Handle to a node builder
///
/// Handles are cheap to clone and all point into the arena of the factory
/// that created them. Mutators return the handle that was actually changed:
/// under [`FreezePolicy::CloneOnWrite`] a frozen node hands back a fresh
/// clone, and the original template stays untouched.
#[derive(Clone)]
pub struct Node {
    pub(crate) ctx: Shared,
    pub(crate) key: NodeKey,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("id", &self.id()).finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ctx, &other.ctx) && self.key == other.key
    }
}

impl Node {
    pub(crate) fn new(ctx: Shared, key: NodeKey) -> Self {
        Self { ctx, key }
    }

    fn sibling(&self, key: NodeKey) -> Node {
        Node::new(self.ctx.clone(), key)
    }

    pub(crate) fn ensure_same_factory(
        &self,
        other: &Shared,
        id: impl FnOnce() -> String,
    ) -> Result<(), AuthoringError> {
        if Rc::ptr_eq(&self.ctx, other) {
            Ok(())
        } else {
            Err(AuthoringError::ForeignBuilder { id: id() })
        }
    }

    fn ensure_link(&self, link: &Link) -> Result<(), AuthoringError> {
        match link {
            Link::Node(target) => target.ensure_same_factory(&self.ctx, || target.id().to_string()),
            Link::Named(_) | Link::Deferred(_) => Ok(()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.ctx.borrow().node(self.key).id.clone()
    }

    pub fn name(&self) -> String {
        self.ctx.borrow().node(self.key).name.clone()
    }

    pub fn texts(&self) -> Vec<TextSegment> {
        self.ctx.borrow().node(self.key).texts.clone()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.ctx.borrow().node(self.key).effects.clone()
    }

    /// Branch rules in evaluation order
    pub fn rules(&self) -> Vec<(Condition, Node)> {
        let ctx = self.ctx.borrow();
        ctx.node(self.key)
            .rules
            .iter()
            .map(|rule| (rule.condition.clone(), self.sibling(rule.target)))
            .collect()
    }

    pub fn next(&self) -> Option<Node> {
        let next = self.ctx.borrow().node(self.key).next;
        next.map(|key| self.sibling(key))
    }

    pub fn prev(&self) -> Option<Node> {
        let prev = self.ctx.borrow().node(self.key).prev;
        prev.map(|key| self.sibling(key))
    }

    pub fn actions(&self) -> Vec<Action> {
        let ctx = self.ctx.borrow();
        ctx.node(self.key)
            .actions
            .iter()
            .map(|key| Action::new(self.ctx.clone(), *key))
            .collect()
    }

    pub fn is_frozen(&self) -> bool {
        self.ctx.borrow().node(self.key).frozen
    }

    /// Node this one was cloned from
    pub fn template(&self) -> Option<Node> {
        let template = self.ctx.borrow().node(self.key).template;
        template.map(|key| self.sibling(key))
    }

    /// Look up a registered node by name
    pub fn get(&self, name: &str) -> Result<Node, AuthoringError> {
        let key = self.ctx.borrow().lookup(name)?;
        Ok(self.sibling(key))
    }

    /// The handle a mutator may change: this node, or a clone of it when frozen
    fn writable(&self, operation: &'static str) -> Result<Node, AuthoringError> {
        let (frozen, policy) = {
            let ctx = self.ctx.borrow();
            (ctx.node(self.key).frozen, ctx.config.freeze_policy)
        };
        if !frozen {
            return Ok(self.clone());
        }

        match policy {
            FreezePolicy::Strict => Err(AuthoringError::Frozen {
                id: self.id(),
                operation,
            }),
            FreezePolicy::CloneOnWrite => {
                let copy = self.clone_template();
                log::debug!(
                    "[Build] '{}' is frozen, {} applies to clone '{}'",
                    self.id(),
                    operation,
                    copy.id()
                );
                Ok(copy)
            }
        }
    }

    fn edit_texts<I, F>(
        &self,
        operation: &'static str,
        fragments: I,
        edit: impl FnOnce(&mut Vec<TextSegment>, Vec<TextSegment>),
    ) -> Result<Node, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        // Fragments may be produced lazily through the factory
        let fragments: Vec<Fragment> = fragments.into_iter().map(Into::into).collect();
        let node = self.writable(operation)?;
        {
            let mut ctx = node.ctx.borrow_mut();
            let segments = ctx.text.compile(fragments);
            edit(&mut ctx.node_mut(node.key).texts, segments);
        }
        Ok(node)
    }

    pub fn append_text<I, F>(&self, fragments: I) -> Result<Node, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("append_text", fragments, |texts, segments| texts.extend(segments))
    }

    pub fn prepend_text<I, F>(&self, fragments: I) -> Result<Node, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("prepend_text", fragments, |texts, segments| {
            texts.splice(0..0, segments);
        })
    }

    pub fn replace_text<I, F>(&self, fragments: I) -> Result<Node, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("replace_text", fragments, |texts, segments| *texts = segments)
    }

    /// Offer `action` on this node
    ///
    /// The action keeps a back-reference to the node for lookups only.
    pub fn attach_action(&self, action: &Action) -> Result<Node, AuthoringError> {
        action.ensure_same_factory(&self.ctx)?;
        let node = self.writable("attach_action")?;
        {
            let mut ctx = node.ctx.borrow_mut();
            ctx.node_mut(node.key).actions.push(action.key);
            ctx.action_mut(action.key).parent = Some(node.key);
        }
        Ok(node)
    }

    /// Set the single successor
    pub fn link_to(&self, target: impl Into<Link>) -> Result<Node, AuthoringError> {
        let target = target.into();
        self.ensure_link(&target)?;
        let node = self.writable("link_to")?;

        match target {
            Link::Deferred(resolve) => {
                node.ctx
                    .borrow_mut()
                    .defer(PendingEdge::Successor { node: node.key, resolve })?;
            }
            Link::Node(next) => {
                node.set_next(&next)?;
            }
            Link::Named(name) => {
                let next = node.get(&name)?;
                node.set_next(&next)?;
            }
        }
        Ok(node)
    }

    /// Link without the frozen guard on `self`, returning the successor actually linked
    pub(crate) fn set_next(&self, target: &Node) -> Result<Node, AuthoringError> {
        target.ensure_same_factory(&self.ctx, || target.id().to_string())?;
        let target = if target.is_frozen() {
            target.clone_template()
        } else {
            target.clone()
        };

        if target.key == self.key {
            return Err(AuthoringError::CyclicSelfLink { id: self.id() });
        }

        let mut ctx = self.ctx.borrow_mut();
        ctx.node_mut(target.key).prev = Some(self.key);
        ctx.node_mut(self.key).next = Some(target.key);
        Ok(target)
    }

    /// Append a conditional jump, checked in order when the node is entered
    ///
    /// A deferred target is resolved by the build pass, which hands the
    /// resolver a clone of this node.
    pub fn branch_on(
        &self,
        key: impl Into<String>,
        op: impl IntoOperator,
        value: impl Into<Value>,
        target: impl Into<Link>,
    ) -> Result<Node, AuthoringError> {
        let condition = Condition::new(key, op.into_operator()?, value);
        let target = target.into();
        self.ensure_link(&target)?;
        let node = self.writable("branch_on")?;

        match target {
            Link::Deferred(resolve) => {
                node.ctx.borrow_mut().defer(PendingEdge::Branch {
                    node: node.key,
                    condition,
                    resolve,
                })?;
            }
            Link::Node(target) => node.push_rule(condition, &target),
            Link::Named(name) => {
                let target = node.get(&name)?;
                node.push_rule(condition, &target);
            }
        }
        Ok(node)
    }

    pub(crate) fn push_rule(&self, condition: Condition, target: &Node) {
        self.ctx
            .borrow_mut()
            .node_mut(self.key)
            .rules
            .push(RuleDraft {
                condition,
                target: target.key,
            });
    }

    fn push_effect(&self, operation: &'static str, effect: Effect) -> Result<Node, AuthoringError> {
        let node = self.writable(operation)?;
        node.ctx.borrow_mut().node_mut(node.key).effects.push(effect);
        Ok(node)
    }

    /// Overwrite `key` whenever the node is entered
    pub fn set_effect(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Node, AuthoringError> {
        self.push_effect("set_effect", Effect::set(key, value))
    }

    /// Add `value` to `key` whenever the node is entered
    pub fn add_effect(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Node, AuthoringError> {
        self.push_effect("add_effect", Effect::add(key, value))
    }

    /// Link to a fresh anonymous node and return it
    pub fn join(&self) -> Result<Node, AuthoringError> {
        let key = self.ctx.borrow_mut().add_node("gen");
        self.join_with(self.sibling(key))
    }

    /// Link to a fresh named node and return it
    pub fn join_named(&self, name: &str) -> Result<Node, AuthoringError> {
        let key = {
            let mut ctx = self.ctx.borrow_mut();
            let key = ctx.add_node(name);
            ctx.register_name(name, key);
            key
        };
        self.join_with(self.sibling(key))
    }

    /// Link to `target` and return the successor
    ///
    /// With a deferred target there is no successor yet, so the node itself
    /// is returned.
    pub fn join_with(&self, target: impl Into<Link>) -> Result<Node, AuthoringError> {
        let target = target.into();
        self.ensure_link(&target)?;

        match target {
            Link::Deferred(resolve) => self.link_to(Link::Deferred(resolve)),
            Link::Node(next) => self.writable("join")?.set_next(&next),
            Link::Named(name) => {
                let next = self.get(&name)?;
                self.writable("join")?.set_next(&next)
            }
        }
    }

    /// Insert `target`'s chain between this node and its current successor
    pub fn returns_to(&self, target: impl Into<Link>) -> Result<Node, AuthoringError> {
        let target = target.into();
        self.ensure_link(&target)?;
        let node = self.writable("returns_to")?;

        match target {
            Link::Deferred(resolve) => {
                node.ctx
                    .borrow_mut()
                    .defer(PendingEdge::Returns { node: node.key, resolve })?;
                Ok(node)
            }
            Link::Node(inserted) => node.splice(&inserted),
            Link::Named(name) => {
                let inserted = node.get(&name)?;
                node.splice(&inserted)
            }
        }
    }

    pub(crate) fn splice(&self, inserted: &Node) -> Result<Node, AuthoringError> {
        let previous = self
            .next()
            .ok_or_else(|| AuthoringError::MissingSuccessor { id: self.id() })?;

        let inserted = self.set_next(inserted)?;
        let last = self.ctx.borrow().tail_before(inserted.key, previous.key);
        if let Some(last) = last {
            self.sibling(last).set_next(&previous)?;
        }

        log::trace!(
            "[Build] '{}' returns through '{}' to '{}'",
            self.id(),
            inserted.id(),
            previous.id()
        );
        Ok(self.clone())
    }

    /// Start of the predecessor chain
    pub fn head(&self) -> Node {
        let key = self.ctx.borrow().head(self.key);
        self.sibling(key)
    }

    /// End of the successor chain
    pub fn tail(&self) -> Node {
        let key = self.ctx.borrow().tail(self.key);
        self.sibling(key)
    }

    /// Independent copy of this node and its successor chain, sharing actions
    pub fn clone_template(&self) -> Node {
        let key = self.ctx.borrow_mut().clone_chain(self.key);
        self.sibling(key)
    }

    /// Turn the chain this node belongs to into a template
    pub fn freeze(&self) -> Node {
        {
            let mut ctx = self.ctx.borrow_mut();
            let head = ctx.head(self.key);
            ctx.freeze_chain(head);
        }
        self.clone()
    }
}
