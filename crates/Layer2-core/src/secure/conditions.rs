//! Conditional privileges
//!
//! A saved-object type may declare named grants that apply only to objects
//! whose attributes match, e.g. `owner` for `ownerId == <current user>`.
//! Each grant is gated by its own action,
//! `saved_object:<type>/<operation>/<name>`.

use super::predicate::Predicate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConditionValue {
    Literal(Value),
    /// Username of the principal making the request
    CurrentUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub value: ConditionValue,
}

/// Named grant restricted by attribute conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalPrivilege {
    pub name: String,
    pub conditions: Vec<Condition>,
}

impl ConditionalPrivilege {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            key: key.into(),
            value: ConditionValue::Literal(value.into()),
        });
        self
    }

    pub fn current_user(mut self, key: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            key: key.into(),
            value: ConditionValue::CurrentUser,
        });
        self
    }

    /// Predicate for `username`: one condition is a plain equality, several are AND-ed
    pub fn predicate(&self, username: &str) -> Predicate {
        let predicates = self
            .conditions
            .iter()
            .map(|condition| {
                let value = match &condition.value {
                    ConditionValue::Literal(value) => value.clone(),
                    ConditionValue::CurrentUser => Value::String(username.to_string()),
                };
                Predicate::property_equals(condition.key.clone(), value)
            })
            .collect();
        Predicate::all(predicates)
    }
}

/// Conditional privileges per saved-object type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionalPrivileges {
    by_type: BTreeMap<String, Vec<ConditionalPrivilege>>,
}

impl ConditionalPrivileges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        object_type: impl Into<String>,
        privilege: ConditionalPrivilege,
    ) -> Self {
        self.by_type
            .entry(object_type.into())
            .or_default()
            .push(privilege);
        self
    }

    pub fn for_type(&self, object_type: &str) -> &[ConditionalPrivilege] {
        self.by_type
            .get(object_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_condition_predicate() {
        let owner = ConditionalPrivilege::new("owner").current_user("ownerId");
        assert_eq!(
            owner.predicate("u1"),
            Predicate::property_equals("ownerId", "u1")
        );
    }

    #[test]
    fn test_multiple_conditions_are_anded() {
        let shared = ConditionalPrivilege::new("shared")
            .current_user("ownerId")
            .equals("visibility", "team");
        let predicate = shared.predicate("u1");

        assert!(matches!(predicate, Predicate::And { ref predicates } if predicates.len() == 2));
        assert!(predicate.matches(&json!({ "ownerId": "u1", "visibility": "team" })));
        assert!(!predicate.matches(&json!({ "ownerId": "u1", "visibility": "private" })));
    }

    #[test]
    fn test_registry_from_json() {
        let registry: ConditionalPrivileges = serde_json::from_value(json!({
            "doc": [{
                "name": "owner",
                "conditions": [{ "key": "ownerId", "value": { "kind": "current_user" } }]
            }]
        }))
        .unwrap();

        assert_eq!(registry.for_type("doc").len(), 1);
        assert!(registry.for_type("foo").is_empty());
    }
}
