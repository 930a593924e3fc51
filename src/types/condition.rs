//! Condition operators, branch rules and action predicates

use crate::error::AuthoringError;
use crate::types::ids::NodeId;
use crate::types::value::{Context, as_number, strict_eq};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Comparison operators understood by branch rules and predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Strict value match
    #[serde(rename = "eq", alias = "=", alias = "equals")]
    Equals,
    /// Numeric comparison, non-numeric operands count as 0
    #[serde(rename = "gt", alias = ">")]
    GreaterThan,
    /// Numeric comparison, non-numeric operands count as 0
    #[serde(rename = "lt", alias = "<")]
    LessThan,
}

impl Operator {
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "eq",
            Operator::GreaterThan => "gt",
            Operator::LessThan => "lt",
        }
    }

    /// Compare the current context value against the expected one
    pub fn evaluate(self, current: Option<&Value>, expected: &Value) -> bool {
        match self {
            Operator::Equals => strict_eq(current, expected),
            Operator::GreaterThan => as_number(current) > as_number(Some(expected)),
            Operator::LessThan => as_number(current) < as_number(Some(expected)),
        }
    }
}

impl FromStr for Operator {
    type Err = AuthoringError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "=" | "eq" | "equals" => Ok(Operator::Equals),
            ">" | "gt" => Ok(Operator::GreaterThan),
            "<" | "lt" => Ok(Operator::LessThan),
            other => Err(AuthoringError::UnsupportedOperator {
                token: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Anything the authoring API accepts in operator position
pub trait IntoOperator {
    fn into_operator(self) -> Result<Operator, AuthoringError>;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Result<Operator, AuthoringError> {
        Ok(self)
    }
}

impl IntoOperator for &str {
    fn into_operator(self) -> Result<Operator, AuthoringError> {
        self.parse()
    }
}

/// A `(key, operator, value)` test against a context snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub op: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(key: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    pub fn holds(&self, context: &Context) -> bool {
        self.op.evaluate(context.get(&self.key), &self.value)
    }
}

/// Ordered conditional override of a node's default successor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    pub key: String,
    pub op: Operator,
    pub value: Value,
    pub target_id: NodeId,
}

impl BranchRule {
    pub fn new(condition: Condition, target_id: NodeId) -> Self {
        Self {
            key: condition.key,
            op: condition.op,
            value: condition.value,
            target_id,
        }
    }

    pub fn matches(&self, context: &Context) -> bool {
        self.op.evaluate(context.get(&self.key), &self.value)
    }
}

/// First matching rule wins
pub fn resolve_branch<'a>(rules: &'a [BranchRule], context: &Context) -> Option<&'a NodeId> {
    rules
        .iter()
        .find(|rule| rule.matches(context))
        .map(|rule| &rule.target_id)
}

/// One predicate entry, keyed by context field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub op: Operator,
    pub value: Value,
}

/// Visibility gate of an action
///
/// When `or` has entries it decides alone and `and` is never consulted.
/// Otherwise every `and` entry must hold; an empty predicate is always true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub and: BTreeMap<String, Check>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub or: BTreeMap<String, Check>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }

    pub fn is_satisfied(&self, context: &Context) -> bool {
        let holds =
            |(key, check): (&String, &Check)| check.op.evaluate(context.get(key), &check.value);

        if !self.or.is_empty() {
            return self.or.iter().any(holds);
        }
        self.and.iter().all(holds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(pairs: &[(&str, Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn operator_tokens_parse() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("eq".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!(">".parse::<Operator>().unwrap(), Operator::GreaterThan);
        assert_eq!("lt".parse::<Operator>().unwrap(), Operator::LessThan);
    }

    #[test]
    fn unknown_operator_is_an_authoring_error() {
        let err = "!=".parse::<Operator>().unwrap_err();
        assert_eq!(
            err,
            AuthoringError::UnsupportedOperator {
                token: "!=".to_string()
            }
        );
    }

    #[test]
    fn numeric_operators_coerce() {
        assert!(Operator::GreaterThan.evaluate(Some(&json!("10")), &json!(5)));
        assert!(Operator::LessThan.evaluate(None, &json!(1)));
        assert!(!Operator::GreaterThan.evaluate(Some(&json!("abc")), &json!(0)));
    }

    #[test]
    fn first_matching_branch_wins() {
        let rules = vec![
            BranchRule::new(Condition::new("score", Operator::GreaterThan, 5), NodeId::from("A")),
            BranchRule::new(Condition::new("score", Operator::GreaterThan, 0), NodeId::from("B")),
        ];

        let ctx = context(&[("score", json!(10))]);
        assert_eq!(resolve_branch(&rules, &ctx), Some(&NodeId::from("A")));

        let ctx = context(&[("score", json!(3))]);
        assert_eq!(resolve_branch(&rules, &ctx), Some(&NodeId::from("B")));

        let ctx = context(&[]);
        assert_eq!(resolve_branch(&rules, &ctx), None);
    }

    #[test]
    fn single_entry_or_matches_single_entry_and() {
        let check = Check {
            op: Operator::Equals,
            value: json!(true),
        };
        let ctx = context(&[("flag", json!(false)), ("other", json!(true))]);

        let or = Predicate {
            or: BTreeMap::from([("flag".to_string(), check.clone())]),
            ..Default::default()
        };
        let and = Predicate {
            and: BTreeMap::from([("flag".to_string(), check)]),
            ..Default::default()
        };

        assert!(!or.is_satisfied(&ctx));
        assert!(!and.is_satisfied(&ctx));
    }

    #[test]
    fn multi_entry_or_and_differ() {
        let eq_true = Check {
            op: Operator::Equals,
            value: json!(true),
        };
        let ctx = context(&[("flag", json!(false)), ("other", json!(true))]);
        let entries = BTreeMap::from([
            ("flag".to_string(), eq_true.clone()),
            ("other".to_string(), eq_true),
        ]);

        let or = Predicate {
            or: entries.clone(),
            ..Default::default()
        };
        let and = Predicate {
            and: entries,
            ..Default::default()
        };

        assert!(or.is_satisfied(&ctx));
        assert!(!and.is_satisfied(&ctx));
    }

    #[test]
    fn or_takes_precedence_over_and() {
        let ctx = context(&[("a", json!(1))]);
        let predicate = Predicate {
            and: BTreeMap::from([(
                "missing".to_string(),
                Check {
                    op: Operator::Equals,
                    value: json!(1),
                },
            )]),
            or: BTreeMap::from([(
                "a".to_string(),
                Check {
                    op: Operator::Equals,
                    value: json!(1),
                },
            )]),
        };

        assert!(predicate.is_satisfied(&ctx));
    }

    #[test]
    fn empty_predicate_is_visible() {
        assert!(Predicate::default().is_satisfied(&Context::new()));
    }
}
