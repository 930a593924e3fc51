//! Core types for the tsuzuri library
//!
//! Plain, serializable data shared by the compiler and the runtime:
//! - Story: the compiled node table
//! - Condition / Effect: branch rules, action predicates, context updates
//! - State: runtime position, context and reveal progress
//! - Event: signals from the presentation layer
//! - Output: what to show after each step

pub mod condition;
pub mod effect;
pub mod event;
pub mod ids;
pub mod output;
pub mod state;
pub mod story;
pub mod text;
pub mod value;

pub use condition::{BranchRule, Check, Condition, Operator, Predicate};
pub use effect::{Effect, EffectOp};
pub use event::Event;
pub use ids::{ActionId, NodeId};
pub use output::{Output, VisibleAction};
pub use state::{RevealTicket, State};
pub use story::{ActionKind, Story, StoryAction, StoryNode};
pub use text::TextSegment;
pub use value::Context;
