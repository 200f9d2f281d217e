//! Role assignment data
//!
//! A role carries zero or more privilege entries. Each entry applies to a
//! list of spaces; the entry whose spaces are exactly `["*"]` is the global
//! entry, and a role may have at most one of those.

use super::definition::PrivilegeDefinition;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Space id marking the global entry
pub const GLOBAL_SPACE: &str = "*";

/// Privilege value reported when nothing is granted
pub const NO_PRIVILEGE: &str = "none";

/// Privileges assigned to a set of spaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacesPrivileges {
    pub spaces: Vec<String>,

    /// Base privileges (`all`, `read`, ...)
    #[serde(default)]
    pub minimum: Vec<String>,

    /// feature id -> feature privileges
    #[serde(default)]
    pub feature: BTreeMap<String, Vec<String>>,
}

impl SpacesPrivileges {
    pub fn new(spaces: &[&str]) -> Self {
        Self {
            spaces: spaces.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Entry applying to every space
    pub fn global() -> Self {
        Self::new(&[GLOBAL_SPACE])
    }

    pub fn minimum(mut self, privileges: &[&str]) -> Self {
        self.minimum = privileges.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn feature(mut self, feature_id: &str, privileges: &[&str]) -> Self {
        self.feature.insert(
            feature_id.to_string(),
            privileges.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn is_global(&self) -> bool {
        self.spaces.iter().any(|s| s == GLOBAL_SPACE)
    }

    pub fn applies_to(&self, space_id: &str) -> bool {
        self.spaces.iter().any(|s| s == space_id)
    }

    /// Most permissive base privilege, once the entry has been ranked
    pub fn base(&self) -> Option<&str> {
        self.minimum.first().map(String::as_str)
    }

    /// Most permissive privilege for `feature_id`, once the entry has been ranked
    pub fn feature_privilege(&self, feature_id: &str) -> Option<&str> {
        self.feature
            .get(feature_id)
            .and_then(|p| p.first())
            .map(String::as_str)
    }
}

/// A role's privilege assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,

    #[serde(default)]
    pub privileges: Vec<SpacesPrivileges>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privileges: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: SpacesPrivileges) -> Self {
        self.privileges.push(entry);
        self
    }

    /// The global entry and its index
    pub fn global_entry(&self) -> Option<(usize, &SpacesPrivileges)> {
        self.privileges.iter().enumerate().find(|(_, p)| p.is_global())
    }

    /// Index of the first non-global entry that lists `space_id`
    pub fn entry_index_for_space(&self, space_id: &str) -> Option<usize> {
        self.privileges
            .iter()
            .position(|p| !p.is_global() && p.applies_to(space_id))
    }

    /// Check the role's structure and that every privilege name exists
    pub fn validate(&self, definition: &PrivilegeDefinition) -> Result<()> {
        let mut global_entries = 0;

        for (index, entry) in self.privileges.iter().enumerate() {
            if entry.spaces.is_empty() {
                return Err(Error::validation(format!(
                    "role '{}': entry {} does not list any spaces",
                    self.name, index
                )));
            }

            let scope = if entry.is_global() {
                global_entries += 1;
                if entry.spaces.len() > 1 {
                    return Err(Error::validation(format!(
                        "role '{}': entry {} mixes '*' with specific spaces",
                        self.name, index
                    )));
                }
                definition.global_privileges()
            } else {
                definition.space_privileges()
            };

            for base in &entry.minimum {
                if !scope.contains(base) {
                    return Err(Error::validation(format!(
                        "role '{}': unknown base privilege '{}'",
                        self.name, base
                    )));
                }
            }

            for (feature_id, privileges) in &entry.feature {
                let Some(feature) = definition.feature_privileges(feature_id) else {
                    return Err(Error::validation(format!(
                        "role '{}': unknown feature '{}'",
                        self.name, feature_id
                    )));
                };
                if let Some(unknown) = privileges.iter().find(|p| !feature.contains(p)) {
                    return Err(Error::validation(format!(
                        "role '{}': unknown privilege '{}' for feature '{}'",
                        self.name, unknown, feature_id
                    )));
                }
            }
        }

        if global_entries > 1 {
            return Err(Error::validation(format!(
                "role '{}' has {} global entries, at most one is allowed",
                self.name, global_entries
            )));
        }

        Ok(())
    }

    /// Entries in display order: the global entry first, the rest as declared
    pub fn sorted_for_display(&self) -> Vec<(usize, &SpacesPrivileges)> {
        let mut entries: Vec<_> = self.privileges.iter().enumerate().collect();
        entries.sort_by(|(_, a), (_, b)| compare_for_display(a, b));
        entries
    }
}

fn compare_for_display(a: &SpacesPrivileges, b: &SpacesPrivileges) -> Ordering {
    match (a.is_global(), b.is_global()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Actions;
    use crate::feature::{Feature, FeaturePrivilege};

    fn definition() -> PrivilegeDefinition {
        let features = vec![Feature::new("feature1")
            .privilege("all", FeaturePrivilege::new().ui(&["a"]))
            .privilege("read", FeaturePrivilege::new())];
        PrivilegeDefinition::build(&features, &Actions::new("1.0.0"))
    }

    #[test]
    fn test_role_from_json() {
        let json = r#"{
            "name": "marketing",
            "privileges": [
                { "spaces": ["*"], "minimum": ["read"] },
                { "spaces": ["marketing"], "feature": { "feature1": ["all"] } }
            ]
        }"#;
        let role: Role = serde_json::from_str(json).unwrap();

        assert_eq!(role.global_entry().map(|(i, _)| i), Some(0));
        assert_eq!(role.entry_index_for_space("marketing"), Some(1));
        assert_eq!(role.privileges[1].feature_privilege("feature1"), Some("all"));
        assert!(role.validate(&definition()).is_ok());
    }

    #[test]
    fn test_validate_rejects_two_global_entries() {
        let role = Role::new("r")
            .with_entry(SpacesPrivileges::global().minimum(&["all"]))
            .with_entry(SpacesPrivileges::global().minimum(&["read"]));
        assert!(role.validate(&definition()).is_err());
    }

    #[test]
    fn test_validate_rejects_mixed_global() {
        let role = Role::new("r").with_entry(SpacesPrivileges::new(&["*", "default"]));
        assert!(role.validate(&definition()).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_names() {
        let unknown_base =
            Role::new("r").with_entry(SpacesPrivileges::new(&["a"]).minimum(&["owner"]));
        let unknown_feature =
            Role::new("r").with_entry(SpacesPrivileges::new(&["a"]).feature("nope", &["all"]));
        let unknown_privilege = Role::new("r")
            .with_entry(SpacesPrivileges::new(&["a"]).feature("feature1", &["write"]));

        assert!(unknown_base.validate(&definition()).is_err());
        assert!(unknown_feature.validate(&definition()).is_err());
        assert!(unknown_privilege.validate(&definition()).is_err());
    }

    #[test]
    fn test_global_entry_sorts_first_for_display() {
        let role = Role::new("r")
            .with_entry(SpacesPrivileges::new(&["b"]))
            .with_entry(SpacesPrivileges::new(&["a"]))
            .with_entry(SpacesPrivileges::global());

        let order: Vec<usize> = role.sorted_for_display().into_iter().map(|(i, _)| i).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }
}
