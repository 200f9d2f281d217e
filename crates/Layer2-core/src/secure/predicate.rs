//! Row-level predicates attached to downstream repository calls

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter over a saved object's attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// `attributes[key] == value`; `key` may be a dotted path
    PropertyEquals { key: String, value: Value },
    And { predicates: Vec<Predicate> },
    Or { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn property_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::PropertyEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Conjunction; a single predicate is returned unchanged
    pub fn all(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::And { predicates }
    }

    /// Disjunction; a single predicate is returned unchanged
    pub fn any(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::Or { predicates }
    }

    pub fn matches(&self, attributes: &Value) -> bool {
        match self {
            Predicate::PropertyEquals { key, value } => {
                lookup(attributes, key).is_some_and(|found| found == value)
            }
            Predicate::And { predicates } => predicates.iter().all(|p| p.matches(attributes)),
            Predicate::Or { predicates } => predicates.iter().any(|p| p.matches(attributes)),
        }
    }
}

fn lookup<'a>(attributes: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(attributes, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_equals() {
        let predicate = Predicate::property_equals("ownerId", "u1");
        assert!(predicate.matches(&json!({ "ownerId": "u1" })));
        assert!(!predicate.matches(&json!({ "ownerId": "u2" })));
        assert!(!predicate.matches(&json!({})));
    }

    #[test]
    fn test_nested_key() {
        let predicate = Predicate::property_equals("meta.team", json!("ops"));
        assert!(predicate.matches(&json!({ "meta": { "team": "ops" } })));
        assert!(!predicate.matches(&json!({ "meta": "ops" })));
    }

    #[test]
    fn test_combinators() {
        let a = Predicate::property_equals("a", 1);
        let b = Predicate::property_equals("b", 2);

        assert_eq!(Predicate::any(vec![a.clone()]), a);
        assert!(Predicate::all(vec![a.clone(), b.clone()]).matches(&json!({ "a": 1, "b": 2 })));
        assert!(!Predicate::all(vec![a.clone(), b.clone()]).matches(&json!({ "a": 1 })));
        assert!(Predicate::any(vec![a, b]).matches(&json!({ "b": 2 })));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Predicate::property_equals("ownerId", "u1")).unwrap();
        assert_eq!(json, json!({ "type": "property_equals", "key": "ownerId", "value": "u1" }));
    }
}
