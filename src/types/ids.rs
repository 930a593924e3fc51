//! Identifier newtypes shared by the builder, the compiled story and the runtime

use serde::{Deserialize, Serialize};

/// Implements the conversions every string identifier needs
macro_rules! impl_string_wrapper {
    ($type:ident) => {
        impl $type {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $type {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $type {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $type {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $type {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Identifier of a dialogue node in a compiled story
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl_string_wrapper!(NodeId);

/// Identifier of a player action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl_string_wrapper!(ActionId);

impl ActionId {
    /// Id of the auxiliary node that carries this action's own text
    pub fn aux_node_id(&self) -> NodeId {
        NodeId(format!("btn_{}", self.0))
    }
}
