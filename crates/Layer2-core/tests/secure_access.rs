//! End-to-end authorization of saved-object calls against a stub
//! privilege-check service and the in-memory repository.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tessera_core::check::{HasPrivilegesRequest, HasPrivilegesResponse, RequestContext};
use tessera_core::secure::BulkCreateObject;
use tessera_core::{
    AuthzError, CheckPrivilegesFactory, ConditionalPrivilege, ConditionalPrivileges, FindOptions,
    InMemorySavedObjectsRepository, PrivilegeCheckTransport, RepositoryOptions,
    SavedObjectsRepository, SecureSavedObjectsClient, TransportError,
};
use tessera_foundation::{Actions, AuditEvent, AuditLogger, AuditQuery};

/// Grants exactly the listed actions, plus `login:` and `version:*`
struct StubTransport {
    username: String,
    granted: HashSet<String>,
}

impl StubTransport {
    fn new(username: &str, granted: &[&str]) -> Self {
        Self {
            username: username.to_string(),
            granted: granted.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PrivilegeCheckTransport for StubTransport {
    async fn has_privileges(
        &self,
        _context: &RequestContext,
        request: &HasPrivilegesRequest,
    ) -> Result<HasPrivilegesResponse, TransportError> {
        let mut application = BTreeMap::new();
        for app in &request.application {
            let resources: BTreeMap<String, BTreeMap<String, bool>> = app
                .resources
                .iter()
                .map(|resource| {
                    let actions: BTreeMap<String, bool> = app
                        .privileges
                        .iter()
                        .map(|action| {
                            let granted = action == "login:"
                                || action.starts_with("version:")
                                || self.granted.contains(action);
                            (action.clone(), granted)
                        })
                        .collect();
                    (resource.clone(), actions)
                })
                .collect();
            application.insert(app.application.clone(), resources);
        }

        Ok(HasPrivilegesResponse {
            has_all_requested: false,
            username: Some(self.username.clone()),
            cluster: BTreeMap::new(),
            application,
        })
    }
}

struct Harness {
    client: SecureSavedObjectsClient,
    repository: Arc<InMemorySavedObjectsRepository>,
    audit: Arc<AuditLogger>,
}

fn harness(username: &str, granted: &[&str]) -> Harness {
    let repository = Arc::new(InMemorySavedObjectsRepository::new());
    let audit = Arc::new(AuditLogger::in_memory().unwrap());

    let checker = CheckPrivilegesFactory::new(
        "kibana-.kibana",
        Actions::new("8.0.0"),
        Arc::new(StubTransport::new(username, granted)),
    )
    .with_request(RequestContext::new("default"));

    let conditions = ConditionalPrivileges::new()
        .register("doc", ConditionalPrivilege::new("owner").current_user("ownerId"));

    let client = SecureSavedObjectsClient::new(repository.clone(), checker, audit.clone())
        .with_conditions(Arc::new(conditions));

    Harness {
        client,
        repository,
        audit,
    }
}

fn failures(audit: &AuditLogger) -> usize {
    audit
        .query(&AuditQuery::new().with_events(vec![AuditEvent::AuthorizationFailure]))
        .unwrap()
        .len()
}

#[tokio::test]
async fn create_without_privilege_is_forbidden() {
    let h = harness("u1", &[]);

    let err = h
        .client
        .create("foo", json!({ "title": "x" }), None, &RepositoryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::Forbidden { .. }));
    assert_eq!(err.to_string(), "Unable to create foo");
    assert!(h.repository.is_empty());
    assert_eq!(failures(&h.audit), 1);
}

#[tokio::test]
async fn bulk_create_lists_only_denied_types() {
    let h = harness("u1", &["saved_object:bar/bulk_create"]);

    let objects = vec![
        BulkCreateObject {
            object_type: "foo".into(),
            id: None,
            attributes: json!({}),
        },
        BulkCreateObject {
            object_type: "bar".into(),
            id: None,
            attributes: json!({}),
        },
    ];

    let err = h
        .client
        .bulk_create(objects, &RepositoryOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unable to bulk_create foo");
    match err {
        AuthzError::Forbidden { missing_actions, .. } => {
            assert_eq!(missing_actions, vec!["saved_object:foo/bulk_create"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.repository.is_empty());
}

#[tokio::test]
async fn conditional_get_only_reads_owned_objects() {
    let h = harness("u1", &["saved_object:doc/get/owner"]);
    let options = RepositoryOptions::default();

    h.repository
        .create("doc", json!({ "ownerId": "u1" }), Some("mine".into()), &options)
        .await
        .unwrap();
    h.repository
        .create("doc", json!({ "ownerId": "u2" }), Some("theirs".into()), &options)
        .await
        .unwrap();

    let mine = h.client.get("doc", "mine", &options).await.unwrap();
    assert_eq!(mine.attributes["ownerId"], "u1");

    let err = h.client.get("doc", "theirs", &options).await.unwrap_err();
    assert!(err.is_not_found());

    // both calls were authorized, the second one was filtered downstream
    assert_eq!(failures(&h.audit), 0);
    assert_eq!(h.audit.statistics().unwrap().total_entries, 2);
}

#[tokio::test]
async fn conditional_find_filters_results() {
    let h = harness("u1", &["saved_object:doc/find/owner"]);
    let options = RepositoryOptions::default();

    for (id, owner) in [("a", "u1"), ("b", "u2"), ("c", "u1")] {
        h.repository
            .create("doc", json!({ "ownerId": owner }), Some(id.into()), &options)
            .await
            .unwrap();
    }

    let found = h
        .client
        .find(&FindOptions::new(&["doc"]), &options)
        .await
        .unwrap();

    assert_eq!(found.total, 2);
    assert!(found
        .saved_objects
        .iter()
        .all(|o| o.attributes["ownerId"] == "u1"));
}

#[tokio::test]
async fn unconditional_grant_sees_everything() {
    let h = harness("u1", &["saved_object:doc/find", "saved_object:doc/find/owner"]);
    let options = RepositoryOptions::default();

    for (id, owner) in [("a", "u1"), ("b", "u2")] {
        h.repository
            .create("doc", json!({ "ownerId": owner }), Some(id.into()), &options)
            .await
            .unwrap();
    }

    let found = h
        .client
        .find(&FindOptions::new(&["doc"]), &options)
        .await
        .unwrap();
    assert_eq!(found.total, 2);
}
