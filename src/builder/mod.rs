//! Story builder DSL
//!
//! A [`StoryFactory`] owns one story under construction. Nodes and actions are
//! handles into it, links may be deferred until the whole graph exists, and
//! [`StoryFactory::build`] resolves those links and compiles the result.
//!
//! ```rust
//! use tsuzuri::builder::{StoryFactory, defer};
//!
//! # fn main() -> Result<(), tsuzuri::error::StoryError> {
//! let f = StoryFactory::new();
//! let root = f.named("gate").append_text(["A locked gate."])?;
//! let open = f.action("Open it").set_effect("opened", true)?;
//! root.attach_action(&open)?;
//! open.link_to(defer(|gate| gate.get("yard")))?;
//! f.named("yard").append_text(["An overgrown yard."])?;
//!
//! let story = f.build(&root)?;
//! assert_eq!(story.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod context;
pub mod node;

pub use action::{Action, DEFAULT_LABEL};
pub use context::{ActionFn, NodeFn};
pub use node::Node;

use crate::compiler;
use crate::config::StoryConfig;
use crate::error::{AuthoringError, StoryError};
use crate::text::Fragment;
use crate::types::story::Story;
use crate::types::text::TextSegment;
use context::{BuilderContext, PendingEdge, Shared};
use std::cell::RefCell;
use std::rc::Rc;

/// Target of a link: a node, a registered name, or a resolver run by the build pass
#[derive(Clone)]
pub enum Link {
    Node(Node),
    Named(String),
    Deferred(NodeFn),
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Link::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Link::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Link::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

impl From<Node> for Link {
    fn from(node: Node) -> Self {
        Link::Node(node)
    }
}

impl From<&Node> for Link {
    fn from(node: &Node) -> Self {
        Link::Node(node.clone())
    }
}

impl From<&str> for Link {
    fn from(name: &str) -> Self {
        Link::Named(name.to_string())
    }
}

impl From<String> for Link {
    fn from(name: String) -> Self {
        Link::Named(name)
    }
}

/// Link resolved by the build pass, once every named node exists
pub fn defer<F>(resolve: F) -> Link
where
    F: Fn(Node) -> Result<Node, AuthoringError> + 'static,
{
    Link::Deferred(Rc::new(resolve))
}

/// Entry point of the DSL
#[derive(Clone)]
pub struct StoryFactory {
    ctx: Shared,
}

impl Default for StoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StoryFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryFactory")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl StoryFactory {
    pub fn new() -> Self {
        Self::with_config(StoryConfig::default())
    }

    pub fn with_config(config: StoryConfig) -> Self {
        Self {
            ctx: Rc::new(RefCell::new(BuilderContext::new(config))),
        }
    }

    pub fn config(&self) -> StoryConfig {
        self.ctx.borrow().config.clone()
    }

    /// Compile fragments with this factory's pacing defaults
    pub fn text<I, F>(&self, fragments: I) -> Vec<TextSegment>
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        self.ctx.borrow().text.compile(fragments)
    }

    pub fn say(&self, text: impl Into<String>) -> TextSegment {
        self.ctx.borrow().text.say(text)
    }

    pub fn write(&self, text: impl Into<String>) -> TextSegment {
        self.ctx.borrow().text.write(text)
    }

    /// Anonymous node, reachable only through links
    pub fn node(&self) -> Node {
        let key = self.ctx.borrow_mut().add_node("gen");
        Node::new(self.ctx.clone(), key)
    }

    /// Node registered under `name` for lookups; the first node of a name keeps it
    pub fn named(&self, name: &str) -> Node {
        let key = {
            let mut ctx = self.ctx.borrow_mut();
            let key = ctx.add_node(name);
            ctx.register_name(name, key);
            key
        };
        Node::new(self.ctx.clone(), key)
    }

    pub fn action(&self, label: &str) -> Action {
        let label = if label.is_empty() { DEFAULT_LABEL } else { label };
        let key = self.ctx.borrow_mut().add_action(label);
        Action::new(self.ctx.clone(), key)
    }

    /// Action finished by `build` in the build pass
    pub fn action_with<F>(&self, label: &str, build: F) -> Result<Action, AuthoringError>
    where
        F: Fn(Action) -> Result<Action, AuthoringError> + 'static,
    {
        let action = self.action(label);
        self.ctx.borrow_mut().defer(PendingEdge::ActionBuild {
            action: action.key,
            resolve: Rc::new(build),
        })?;
        Ok(action)
    }

    pub fn get(&self, name: &str) -> Result<Node, AuthoringError> {
        let key = self.ctx.borrow().lookup(name)?;
        Ok(Node::new(self.ctx.clone(), key))
    }

    pub fn clone_template(&self, node: &Node) -> Result<Node, AuthoringError> {
        node.ensure_same_factory(&self.ctx, || node.id().to_string())?;
        Ok(node.clone_template())
    }

    /// Every clone made from `node`, oldest first
    pub fn clones_of(&self, node: &Node) -> Vec<Node> {
        let ctx = self.ctx.borrow();
        ctx.clones_of(node.key)
            .iter()
            .map(|key| Node::new(self.ctx.clone(), *key))
            .collect()
    }

    /// Deferred links still waiting for the build pass
    pub fn pending(&self) -> usize {
        self.ctx.borrow().pending_len()
    }

    /// Run the build pass: resolve deferred links, newest first
    ///
    /// Returns how many links were resolved. Calling it again resolves only
    /// links registered since.
    pub fn resolve(&self) -> Result<usize, AuthoringError> {
        let pending = self.ctx.borrow_mut().begin_resolving();
        let count = pending.len();
        log::debug!("[Build] Resolving {} deferred links", count);

        let result = pending
            .into_iter()
            .rev()
            .try_for_each(|edge| self.resolve_edge(edge));
        self.ctx.borrow_mut().end_resolving();

        result.map(|_| count)
    }

    fn resolve_edge(&self, edge: PendingEdge) -> Result<(), AuthoringError> {
        match edge {
            PendingEdge::Successor { node, resolve } => {
                let node = Node::new(self.ctx.clone(), node);
                let target = resolve(node.clone())?;
                node.set_next(&target)?;
            }
            PendingEdge::Branch { node, condition, resolve } => {
                let node = Node::new(self.ctx.clone(), node);
                let target = resolve(node.clone_template())?;
                target.ensure_same_factory(&self.ctx, || target.id().to_string())?;
                node.push_rule(condition, &target);
            }
            PendingEdge::Returns { node, resolve } => {
                let node = Node::new(self.ctx.clone(), node);
                let target = resolve(node.clone())?;
                node.splice(&target)?;
            }
            PendingEdge::ActionBuild { action, resolve } => {
                resolve(Action::new(self.ctx.clone(), action))?;
            }
            PendingEdge::ActionSuccessor { action, resolve } => {
                let action = Action::new(self.ctx.clone(), action);
                let parent = action
                    .parent()
                    .ok_or_else(|| AuthoringError::OrphanAction { id: action.id() })?;
                let target = resolve(parent)?;
                action.set_next(&target)?;
            }
        }
        Ok(())
    }

    /// Resolve deferred links and compile the graph reachable from `root`
    pub fn build(&self, root: &Node) -> Result<Story, StoryError> {
        root.ensure_same_factory(&self.ctx, || root.id().to_string())?;
        self.resolve()?;
        Ok(compiler::compile(root)?)
    }
}
