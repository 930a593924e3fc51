//! Context effects applied on node entry and action selection

use crate::types::value::{Context, as_number, number_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectOp {
    /// Overwrite the key
    Set,
    /// Numeric accumulation, a missing or non-numeric prior value counts as 0
    Add,
}

/// A `(key, operation, value)` mutation of the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub key: String,
    pub op: EffectOp,
    pub value: Value,
}

impl Effect {
    pub fn set(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op: EffectOp::Set,
            value: value.into(),
        }
    }

    pub fn add(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op: EffectOp::Add,
            value: value.into(),
        }
    }

    pub fn apply(&self, context: &mut Context) {
        let updated = match self.op {
            EffectOp::Set => self.value.clone(),
            EffectOp::Add => {
                number_value(as_number(context.get(&self.key)) + as_number(Some(&self.value)))
            }
        };
        log::trace!("[Effect] {} {:?} {} -> {}", self.key, self.op, self.value, updated);
        context.insert(self.key.clone(), updated);
    }
}

/// Apply effects in order, each one seeing the result of the previous
pub fn apply_all(effects: &[Effect], context: &mut Context) {
    for effect in effects {
        effect.apply(context);
    }
}
