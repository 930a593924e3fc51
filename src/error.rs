//! Error taxonomy for authoring, compiling and running stories

use crate::types::ids::{ActionId, NodeId};
use thiserror::Error;

/// Raised while a story is being authored or resolved by the build pass
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthoringError {
    #[error("Unsupported condition operator '{token}'")]
    UnsupportedOperator { token: String },

    #[error("Node by name '{name}' not found")]
    UnknownName { name: String },

    #[error("Unable to link node '{id}' to itself")]
    CyclicSelfLink { id: NodeId },

    #[error("Unable to splice a return into node '{id}': it has no successor")]
    MissingSuccessor { id: NodeId },

    #[error("Action '{id}' is frozen and cannot be changed ({operation})")]
    FrozenAction { id: ActionId, operation: &'static str },

    #[error("Node '{id}' is frozen and can be used only as template ({operation})")]
    Frozen { id: NodeId, operation: &'static str },

    #[error("Deferred link registered on '{target}' while deferred links were being resolved")]
    NestedContinuation { target: String },

    #[error("Builder '{id}' belongs to another story factory")]
    ForeignBuilder { id: String },

    #[error("Action '{id}' has no parent node to resolve its deferred link against")]
    OrphanAction { id: ActionId },
}

/// Raised when the flattened node table is inconsistent
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("Reference to unknown node '{target}' from {origin}")]
    DanglingReference { target: NodeId, origin: String },

    #[error("Root node '{root}' is not part of the story")]
    MissingRoot { root: NodeId },

    #[error("Node id '{id}' is used by more than one node")]
    DuplicateNodeId { id: NodeId },
}

/// Raised while interpreting a compiled story
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Node '{id}' does not exist in the story")]
    UnknownNode { id: NodeId },

    #[error("Action '{action}' does not exist on node '{node}'")]
    UnknownAction { node: NodeId, action: ActionId },

    #[error("Action '{action}' on node '{node}' is not visible in the current context")]
    ActionNotVisible { node: NodeId, action: ActionId },

    #[error("Node '{node}' is not waiting for a choice")]
    NotAwaitingChoice { node: NodeId },

    #[error("Routing loop through text-less node '{node}'")]
    RoutingLoop { node: NodeId },
}

/// Any failure of the author → build → compile pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoryError {
    #[error("Authoring error: {0}")]
    Authoring(#[from] AuthoringError),

    #[error("Compilation error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}
