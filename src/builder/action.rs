//! Action builder: a player-selectable choice attached to a node

use crate::builder::Link;
use crate::builder::context::{ActionKey, PendingEdge, Shared};
use crate::builder::node::Node;
use crate::error::AuthoringError;
use crate::text::Fragment;
use crate::types::condition::{Check, IntoOperator, Predicate};
use crate::types::effect::Effect;
use crate::types::ids::ActionId;
use crate::types::text::TextSegment;
use serde_json::Value;
use std::rc::Rc;

/// Label used when an action is created without one
pub const DEFAULT_LABEL: &str = "???";

/// Handle to an action builder
///
/// Unlike nodes, a frozen action is never cloned: every mutator fails with
/// [`AuthoringError::FrozenAction`].
#[derive(Clone)]
pub struct Action {
    pub(crate) ctx: Shared,
    pub(crate) key: ActionKey,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("id", &self.id()).finish()
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ctx, &other.ctx) && self.key == other.key
    }
}

impl Action {
    pub(crate) fn new(ctx: Shared, key: ActionKey) -> Self {
        Self { ctx, key }
    }

    pub(crate) fn ensure_same_factory(&self, other: &Shared) -> Result<(), AuthoringError> {
        if Rc::ptr_eq(&self.ctx, other) {
            Ok(())
        } else {
            Err(AuthoringError::ForeignBuilder {
                id: self.id().to_string(),
            })
        }
    }

    fn writable(&self, operation: &'static str) -> Result<(), AuthoringError> {
        if self.is_frozen() {
            return Err(AuthoringError::FrozenAction {
                id: self.id(),
                operation,
            });
        }
        Ok(())
    }

    fn node(&self, key: crate::builder::context::NodeKey) -> Node {
        Node::new(self.ctx.clone(), key)
    }

    pub fn id(&self) -> ActionId {
        self.ctx.borrow().action(self.key).id.clone()
    }

    pub fn label_text(&self) -> String {
        self.ctx.borrow().action(self.key).label.clone()
    }

    pub fn texts(&self) -> Vec<TextSegment> {
        self.ctx.borrow().action(self.key).texts.clone()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.ctx.borrow().action(self.key).effects.clone()
    }

    /// Visibility gate as it will be compiled
    pub fn predicate(&self) -> Predicate {
        let ctx = self.ctx.borrow();
        let data = ctx.action(self.key);
        Predicate {
            and: data.and.clone(),
            or: data.or.clone(),
        }
    }

    /// Node the action was last attached to
    pub fn parent(&self) -> Option<Node> {
        let parent = self.ctx.borrow().action(self.key).parent;
        parent.map(|key| self.node(key))
    }

    pub fn next(&self) -> Option<Node> {
        let next = self.ctx.borrow().action(self.key).next;
        next.map(|key| self.node(key))
    }

    pub fn is_frozen(&self) -> bool {
        self.ctx.borrow().action(self.key).frozen
    }

    /// Look up a registered node by name
    pub fn get(&self, name: &str) -> Result<Node, AuthoringError> {
        let key = self.ctx.borrow().lookup(name)?;
        Ok(self.node(key))
    }

    pub fn label(&self, label: impl Into<String>) -> Result<Action, AuthoringError> {
        self.writable("label")?;
        self.ctx.borrow_mut().action_mut(self.key).label = label.into();
        Ok(self.clone())
    }

    fn edit_texts<I, F>(
        &self,
        operation: &'static str,
        fragments: I,
        edit: impl FnOnce(&mut Vec<TextSegment>, Vec<TextSegment>),
    ) -> Result<Action, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        let fragments: Vec<Fragment> = fragments.into_iter().map(Into::into).collect();
        self.writable(operation)?;
        {
            let mut ctx = self.ctx.borrow_mut();
            let segments = ctx.text.compile(fragments);
            edit(&mut ctx.action_mut(self.key).texts, segments);
        }
        Ok(self.clone())
    }

    pub fn append_text<I, F>(&self, fragments: I) -> Result<Action, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("append_text", fragments, |texts, segments| texts.extend(segments))
    }

    pub fn prepend_text<I, F>(&self, fragments: I) -> Result<Action, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("prepend_text", fragments, |texts, segments| {
            texts.splice(0..0, segments);
        })
    }

    pub fn replace_text<I, F>(&self, fragments: I) -> Result<Action, AuthoringError>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.edit_texts("replace_text", fragments, |texts, segments| *texts = segments)
    }

    /// Require `key op value`; one entry per key, later calls win
    pub fn and(
        &self,
        key: impl Into<String>,
        op: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<Action, AuthoringError> {
        let check = Check {
            op: op.into_operator()?,
            value: value.into(),
        };
        self.writable("and")?;
        self.ctx
            .borrow_mut()
            .action_mut(self.key)
            .and
            .insert(key.into(), check);
        Ok(self.clone())
    }

    /// Alternative condition; when any `or` entry exists the `and` entries are ignored
    pub fn or(
        &self,
        key: impl Into<String>,
        op: impl IntoOperator,
        value: impl Into<Value>,
    ) -> Result<Action, AuthoringError> {
        let check = Check {
            op: op.into_operator()?,
            value: value.into(),
        };
        self.writable("or")?;
        self.ctx
            .borrow_mut()
            .action_mut(self.key)
            .or
            .insert(key.into(), check);
        Ok(self.clone())
    }

    fn push_effect(
        &self,
        operation: &'static str,
        effect: Effect,
    ) -> Result<Action, AuthoringError> {
        self.writable(operation)?;
        self.ctx.borrow_mut().action_mut(self.key).effects.push(effect);
        Ok(self.clone())
    }

    pub fn set_effect(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Action, AuthoringError> {
        self.push_effect("set_effect", Effect::set(key, value))
    }

    pub fn add_effect(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Action, AuthoringError> {
        self.push_effect("add_effect", Effect::add(key, value))
    }

    /// Set the node entered when the action is selected
    ///
    /// A deferred resolver receives the node the action is attached to.
    pub fn link_to(&self, target: impl Into<Link>) -> Result<Action, AuthoringError> {
        let target = target.into();
        self.writable("link_to")?;

        match target {
            Link::Deferred(resolve) => {
                self.ctx.borrow_mut().defer(PendingEdge::ActionSuccessor {
                    action: self.key,
                    resolve,
                })?;
            }
            Link::Node(next) => {
                self.set_next(&next)?;
            }
            Link::Named(name) => {
                let next = self.get(&name)?;
                self.set_next(&next)?;
            }
        }
        Ok(self.clone())
    }

    pub(crate) fn set_next(&self, target: &Node) -> Result<Node, AuthoringError> {
        target.ensure_same_factory(&self.ctx, || target.id().to_string())?;
        let target = if target.is_frozen() {
            target.clone_template()
        } else {
            target.clone()
        };
        self.ctx.borrow_mut().action_mut(self.key).next = Some(target.key);
        Ok(target)
    }

    /// Link to a fresh anonymous node and return it
    pub fn join(&self) -> Result<Node, AuthoringError> {
        self.writable("join")?;
        let key = self.ctx.borrow_mut().add_node("gen");
        self.set_next(&self.node(key))
    }

    /// Link to a fresh named node and return it
    pub fn join_named(&self, name: &str) -> Result<Node, AuthoringError> {
        self.writable("join")?;
        let key = {
            let mut ctx = self.ctx.borrow_mut();
            let key = ctx.add_node(name);
            ctx.register_name(name, key);
            key
        };
        self.set_next(&self.node(key))
    }

    pub fn freeze(&self) -> Action {
        self.ctx.borrow_mut().action_mut(self.key).frozen = true;
        self.clone()
    }
}
