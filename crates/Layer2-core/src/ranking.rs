//! Privilege ranking
//!
//! Orders privileges within a scope from most to least permissive by
//! action-set containment. Containment is a partial order: two privileges
//! whose action sets are incomparable keep their input-relative order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tessera_foundation::{Action, PrivilegeDefinition, PrivilegeSet};

/// `Less` if `a` grants a strict superset of `b`, `Greater` for the
/// inverse, `Equal` when neither strictly contains the other
pub fn compare_actions(a: &[Action], b: &[Action]) -> Ordering {
    let a: HashSet<&Action> = a.iter().collect();
    let b: HashSet<&Action> = b.iter().collect();

    if a.len() > b.len() && b.is_subset(&a) {
        Ordering::Less
    } else if b.len() > a.len() && a.is_subset(&b) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Stable insertion sort driven by a possibly partial comparator
///
/// An element only moves ahead of neighbours it strictly precedes, so
/// incomparable elements never trade places.
pub fn rank_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j], &items[j - 1]) == Ordering::Less {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Sort privilege names of `set` from most to least permissive
///
/// Names unknown to `set` rank as if they granted nothing.
pub fn rank_names(names: &mut [String], set: &PrivilegeSet) {
    rank_by(names, |a, b| {
        compare_actions(
            set.actions(a).unwrap_or_default(),
            set.actions(b).unwrap_or_default(),
        )
    });
}

/// Privilege names of every scope, most permissive first
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RankedPrivileges {
    global: Vec<String>,
    space: Vec<String>,
    features: BTreeMap<String, Vec<String>>,
}

impl RankedPrivileges {
    pub fn from_definition(definition: &PrivilegeDefinition) -> Self {
        let rank_set = |set: &PrivilegeSet| {
            let mut names: Vec<String> = set.names().map(str::to_string).collect();
            rank_names(&mut names, set);
            names
        };

        Self {
            global: rank_set(definition.global_privileges()),
            space: rank_set(definition.space_privileges()),
            features: definition
                .features
                .iter()
                .map(|(id, set)| (id.clone(), rank_set(set)))
                .collect(),
        }
    }

    pub fn global(&self) -> &[String] {
        &self.global
    }

    pub fn space(&self) -> &[String] {
        &self.space
    }

    pub fn feature(&self, feature_id: &str) -> &[String] {
        self.features
            .get(feature_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn global_rank(&self, privilege: &str) -> Option<usize> {
        position(&self.global, privilege)
    }

    pub fn space_rank(&self, privilege: &str) -> Option<usize> {
        position(&self.space, privilege)
    }

    pub fn feature_rank(&self, feature_id: &str, privilege: &str) -> Option<usize> {
        position(self.feature(feature_id), privilege)
    }
}

fn position(names: &[String], privilege: &str) -> Option<usize> {
    names.iter().position(|n| n == privilege)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_foundation::{Actions, Feature, FeaturePrivilege};

    fn actions(names: &[&str]) -> Vec<Action> {
        let factory = Actions::new("1.0.0");
        names.iter().map(|n| factory.raw(*n)).collect()
    }

    #[test]
    fn test_compare_actions() {
        let big = actions(&["a", "b", "c"]);
        let small = actions(&["a", "b"]);
        let other = actions(&["a", "d"]);

        assert_eq!(compare_actions(&big, &small), Ordering::Less);
        assert_eq!(compare_actions(&small, &big), Ordering::Greater);
        assert_eq!(compare_actions(&small, &other), Ordering::Equal);
        assert_eq!(compare_actions(&big, &big), Ordering::Equal);
    }

    #[test]
    fn test_superset_ranks_first() {
        let set = PrivilegeSet::new()
            .with("read", actions(&["a"]))
            .with("minimal", actions(&[]))
            .with("all", actions(&["a", "b"]));

        let mut names = vec!["minimal".to_string(), "read".to_string(), "all".to_string()];
        rank_names(&mut names, &set);
        assert_eq!(names, vec!["all", "read", "minimal"]);
    }

    #[test]
    fn test_incomparable_keep_input_order() {
        let set = PrivilegeSet::new()
            .with("left", actions(&["a"]))
            .with("right", actions(&["b"]));

        let mut names = vec!["right".to_string(), "left".to_string()];
        rank_names(&mut names, &set);
        assert_eq!(names, vec!["right", "left"]);
    }

    #[test]
    fn test_unknown_names_rank_last() {
        let set = PrivilegeSet::new().with("read", actions(&["a"]));
        let mut names = vec!["bogus".to_string(), "read".to_string()];
        rank_names(&mut names, &set);
        assert_eq!(names, vec!["read", "bogus"]);
    }

    #[test]
    fn test_ranked_from_definition() {
        let features = vec![Feature::new("feature1")
            .privilege("read", FeaturePrivilege::new().saved_object_read(&["doc"]))
            .privilege("all", FeaturePrivilege::new().saved_object_all(&["doc"]))];
        let definition = PrivilegeDefinition::build(&features, &Actions::new("1.0.0"));
        let ranked = RankedPrivileges::from_definition(&definition);

        assert_eq!(ranked.global(), &["all", "read"]);
        assert_eq!(ranked.space(), &["all", "read"]);
        assert_eq!(ranked.feature("feature1"), &["all", "read"]);
        assert_eq!(ranked.feature_rank("feature1", "read"), Some(1));
        assert_eq!(ranked.space_rank("none"), None);
        assert!(ranked.feature("missing").is_empty());
    }
}
