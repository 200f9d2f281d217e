//! Effective privileges over features and roles loaded from JSON files

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tessera_core::{EffectivePrivilegesFactory, PrivilegeSource, GLOBAL_BASE_PRIVILEGE};
use tessera_foundation::{load_features, load_role, Actions, JsonStore, PrivilegeDefinition};

fn store() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::new(dir.path());

    store
        .save(
            "features.json",
            &json!([
                {
                    "id": "feature1",
                    "navLinkId": "feature1",
                    "privileges": {
                        "all": { "savedObject": { "all": ["doc"] }, "ui": ["show", "save"] },
                        "read": { "savedObject": { "read": ["doc"] }, "ui": ["show"] }
                    }
                },
                {
                    "id": "feature2",
                    "privileges": {
                        "all": { "api": ["f2/write", "f2/read"] },
                        "read": { "api": ["f2/read"] }
                    }
                }
            ]),
        )
        .unwrap();

    store
        .save(
            "role.json",
            &json!({
                "name": "marketing_editor",
                "privileges": [
                    { "spaces": ["*"], "minimum": ["all"] },
                    { "spaces": ["marketing"], "feature": { "feature1": ["read"] } }
                ]
            }),
        )
        .unwrap();

    (dir, store)
}

#[test]
fn global_all_overrides_space_read() {
    let (_dir, store) = store();
    let features = load_features(&store).unwrap();
    let definition = PrivilegeDefinition::build(&features, &Actions::new("8.0.0"));
    let role = load_role(&store, "role.json", &definition).unwrap();

    let factory = EffectivePrivilegesFactory::new(Arc::new(definition));
    let effective = factory.get_instance(&role);

    let index = role.entry_index_for_space("marketing").unwrap();
    let explanation = effective.explain_actual_space_feature_privilege("feature1", index);

    assert_eq!(explanation.privilege, "all");
    assert_eq!(explanation.source, PrivilegeSource::EffectiveOverridesAssigned);
    assert_eq!(explanation.superseded_privilege.as_deref(), Some("read"));
    assert_eq!(explanation.override_source.as_deref(), Some(GLOBAL_BASE_PRIVILEGE));

    assert!(!effective.can_assign_space_feature_privilege("feature1", "read", index));
    assert!(!effective.can_assign_space_feature_privilege("feature1", "all", index));
}

#[test]
fn instances_share_one_table() {
    let (_dir, store) = store();
    let features = load_features(&store).unwrap();
    let definition = Arc::new(PrivilegeDefinition::build(&features, &Actions::new("8.0.0")));
    let role = load_role(&store, "role.json", &definition).unwrap();

    let factory = EffectivePrivilegesFactory::new(definition);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let factory = factory.clone();
            let role = role.clone();
            std::thread::spawn(move || {
                factory
                    .get_instance(&role)
                    .get_actual_space_feature_privilege("feature2", 1)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "all");
    }
}
