//! Privilege definition
//!
//! Static catalog of the privileges that exist at global scope, at space
//! scope, and per feature, along with the actions each one grants. Built
//! once at startup and shared read-only afterwards.

use crate::action::{Action, Actions};
use crate::feature::{
    build_features_privileges, get_api_read_actions, get_ui_read_actions, Feature,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashSet};

/// Name of the most permissive base privilege
pub const ALL: &str = "all";
/// Name of the read-only base privilege
pub const READ: &str = "read";

// ============================================================================
// PrivilegeSet
// ============================================================================

/// Ordered set of named privileges within one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeSet {
    entries: Vec<(String, Vec<Action>)>,
}

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a privilege, keeping declaration order
    pub fn insert(&mut self, name: impl Into<String>, actions: Vec<Action>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = actions,
            None => self.entries.push((name, actions)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, actions: Vec<Action>) -> Self {
        self.insert(name, actions);
        self
    }

    /// Privilege names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn actions(&self, name: &str) -> Option<&[Action]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Action])> {
        self.entries
            .iter()
            .map(|(n, a)| (n.as_str(), a.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PrivilegeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, actions) in &self.entries {
            map.serialize_entry(name, actions)?;
        }
        map.end()
    }
}

// ============================================================================
// PrivilegeDefinition
// ============================================================================

/// Global, space, and feature privileges
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PrivilegeDefinition {
    pub global: PrivilegeSet,
    pub space: PrivilegeSet,
    pub features: BTreeMap<String, PrivilegeSet>,
}

impl PrivilegeDefinition {
    /// Assemble a definition from explicit sets
    pub fn new(
        global: PrivilegeSet,
        space: PrivilegeSet,
        features: BTreeMap<String, PrivilegeSet>,
    ) -> Self {
        Self {
            global,
            space,
            features,
        }
    }

    /// Derive the full definition from feature descriptors
    ///
    /// - `space.all`: login, version, and every action of every feature
    /// - `space.read`: login, version, and every action of each feature's `read`
    /// - `global.all`: `space.all` plus space management
    /// - `global.read`: same as `space.read`
    ///
    /// Features flagged `excludeFromBasePrivileges` contribute nothing to
    /// the base privileges.
    pub fn build(features: &[Feature], actions: &Actions) -> Self {
        let features_privileges = build_features_privileges(features, actions);

        let base_features: Vec<Feature> = features
            .iter()
            .filter(|f| !f.exclude_from_base_privileges)
            .cloned()
            .collect();

        let mut all_actions = vec![actions.login(), actions.version()];
        let mut read_actions = vec![actions.login(), actions.version()];
        read_actions.extend(get_api_read_actions(&base_features, actions));
        read_actions.extend(get_ui_read_actions(&base_features, actions));

        for feature in &base_features {
            let Some(privileges) = features_privileges.get(&feature.id) else {
                continue;
            };
            for feature_actions in privileges.values() {
                all_actions.extend(feature_actions.iter().cloned());
            }
            if let Some(read) = privileges.get(READ) {
                read_actions.extend(read.iter().cloned());
            }
        }

        let all_actions = dedup(all_actions);
        let read_actions = dedup(read_actions);

        let mut global_all = all_actions.clone();
        global_all.push(actions.space_manage());
        global_all.push(actions.ui("spaces", &["manage"]));

        let global = PrivilegeSet::new()
            .with(ALL, dedup(global_all))
            .with(READ, read_actions.clone());
        let space = PrivilegeSet::new()
            .with(ALL, all_actions)
            .with(READ, read_actions);

        let features = features_privileges
            .into_iter()
            .map(|(id, privileges)| {
                let set = privileges
                    .into_iter()
                    .fold(PrivilegeSet::new(), |set, (name, a)| set.with(name, a));
                (id, set)
            })
            .collect();

        Self {
            global,
            space,
            features,
        }
    }

    pub fn global_privileges(&self) -> &PrivilegeSet {
        &self.global
    }

    pub fn space_privileges(&self) -> &PrivilegeSet {
        &self.space
    }

    pub fn feature_privileges(&self, feature_id: &str) -> Option<&PrivilegeSet> {
        self.features.get(feature_id)
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }
}

fn dedup(actions: Vec<Action>) -> Vec<Action> {
    let mut seen = HashSet::new();
    actions
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}
