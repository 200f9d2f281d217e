//! Feature-privileges builder
//!
//! Derives, for every feature and every declared privilege, the list of
//! actions that privilege grants.

use super::types::{Feature, FeaturePrivilege};
use crate::action::{Action, Actions};
use std::collections::{BTreeMap, HashSet};

/// feature id -> privilege name -> granted actions
pub type FeaturesPrivileges = BTreeMap<String, BTreeMap<String, Vec<Action>>>;

/// Ordered, de-duplicated action accumulator
#[derive(Default)]
struct ActionList {
    seen: HashSet<Action>,
    actions: Vec<Action>,
}

impl ActionList {
    fn push(&mut self, action: Action) {
        if self.seen.insert(action.clone()) {
            self.actions.push(action);
        }
    }

    fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.push(action);
        }
    }

    fn into_vec(self) -> Vec<Action> {
        self.actions
    }
}

/// Build the action lists of every privilege of every feature
pub fn build_features_privileges(features: &[Feature], actions: &Actions) -> FeaturesPrivileges {
    features
        .iter()
        .map(|feature| {
            let privileges = feature
                .privileges
                .iter()
                .map(|(name, privilege)| {
                    (
                        name.clone(),
                        build_feature_privilege(feature, privilege, actions),
                    )
                })
                .collect();
            (feature.id.clone(), privileges)
        })
        .collect()
}

fn build_feature_privilege(
    feature: &Feature,
    privilege: &FeaturePrivilege,
    actions: &Actions,
) -> Vec<Action> {
    let mut list = ActionList::default();

    list.push(actions.login());
    list.push(actions.version());
    list.extend(privilege.api.iter().map(|op| actions.api(op)));
    list.extend(privilege.app.iter().map(|app| actions.app(app)));

    for object_type in &privilege.saved_object.all {
        list.extend(actions.saved_object_all(object_type));
    }
    for object_type in &privilege.saved_object.read {
        list.extend(actions.saved_object_read(object_type));
    }

    list.extend(
        privilege
            .ui
            .iter()
            .map(|capability| actions.ui(&feature.id, &[capability])),
    );
    list.extend(privilege.catalogue.iter().map(|entry| actions.catalogue(entry)));
    for (section, entries) in &privilege.management {
        list.extend(entries.iter().map(|entry| actions.management(section, entry)));
    }

    if let Some(nav_link_id) = &feature.nav_link_id {
        if privilege.nav_link {
            list.push(actions.nav_link(nav_link_id));
        }
    }

    list.into_vec()
}

/// API actions granted by each feature's `read` privilege
pub fn get_api_read_actions(features: &[Feature], actions: &Actions) -> Vec<Action> {
    let mut list = ActionList::default();
    for read in features.iter().filter_map(Feature::read_privilege) {
        list.extend(read.api.iter().map(|op| actions.api(op)));
    }
    list.into_vec()
}

/// UI actions granted by each feature's `read` privilege
pub fn get_ui_read_actions(features: &[Feature], actions: &Actions) -> Vec<Action> {
    let mut list = ActionList::default();
    for feature in features {
        if let Some(read) = feature.read_privilege() {
            list.extend(
                read.ui
                    .iter()
                    .map(|capability| actions.ui(&feature.id, &[capability])),
            );
        }
    }
    list.into_vec()
}
