//! Check-privileges client
//!
//! Builds one `_has_privileges` request per call, validates that the answer
//! covers exactly what was asked, and strips the implicit `login` and
//! `version` actions from the result unless the caller asked for them.

use super::resource::{ResourceSerializer, GLOBAL_RESOURCE};
use super::transport::PrivilegeCheckTransport;
use super::types::{
    ApplicationPrivilegesRequest, CheckPrivilegesAtSpacesResponse, CheckPrivilegesResponse,
    HasPrivilegesRequest, HasPrivilegesResponse, PrivilegeMap, RequestContext,
    ResourcePrivileges,
};
use crate::error::{AuthzError, Result};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tessera_foundation::Actions;
use tracing::{debug, warn};

/// Produces request-scoped [`CheckPrivileges`]
#[derive(Clone)]
pub struct CheckPrivilegesFactory {
    application: Arc<str>,
    actions: Actions,
    transport: Arc<dyn PrivilegeCheckTransport>,
}

impl CheckPrivilegesFactory {
    pub fn new(
        application: impl Into<String>,
        actions: Actions,
        transport: Arc<dyn PrivilegeCheckTransport>,
    ) -> Self {
        Self {
            application: Arc::from(application.into()),
            actions,
            transport,
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn with_request(&self, context: RequestContext) -> CheckPrivileges {
        CheckPrivileges {
            application: Arc::clone(&self.application),
            actions: self.actions.clone(),
            transport: Arc::clone(&self.transport),
            context,
        }
    }
}

/// Privilege checks on behalf of one request
#[derive(Clone)]
pub struct CheckPrivileges {
    application: Arc<str>,
    actions: Actions,
    transport: Arc<dyn PrivilegeCheckTransport>,
    context: RequestContext,
}

struct Checked {
    has_all_requested: bool,
    username: String,
    resources: ResourcePrivileges,
    cluster: PrivilegeMap,
}

impl CheckPrivileges {
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Check `privileges` in one space
    pub async fn at_space(
        &self,
        space_id: &str,
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<CheckPrivilegesResponse> {
        let resource = ResourceSerializer::serialize_space_resource(space_id);
        self.single(resource, privileges, cluster_privileges).await
    }

    /// Check `privileges` in each of `space_ids`
    pub async fn at_spaces(
        &self,
        space_ids: &[String],
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<CheckPrivilegesAtSpacesResponse> {
        let resources: Vec<String> = space_ids
            .iter()
            .map(|id| ResourceSerializer::serialize_space_resource(id))
            .collect();

        let checked = self
            .check(resources, privileges, cluster_privileges)
            .await?;

        let mut space_privileges = ResourcePrivileges::new();
        for (resource, actions) in checked.resources {
            let space_id = ResourceSerializer::deserialize_space_resource(&resource)?;
            space_privileges.insert(space_id, actions);
        }

        Ok(CheckPrivilegesAtSpacesResponse {
            has_all_requested: checked.has_all_requested,
            username: checked.username,
            space_privileges,
            cluster: checked.cluster,
        })
    }

    /// Check `privileges` against the global resource
    pub async fn globally(
        &self,
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<CheckPrivilegesResponse> {
        self.single(GLOBAL_RESOURCE.to_string(), privileges, cluster_privileges)
            .await
    }

    async fn single(
        &self,
        resource: String,
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<CheckPrivilegesResponse> {
        let checked = self
            .check(vec![resource.clone()], privileges, cluster_privileges)
            .await?;

        let mut resources = checked.resources;
        let privileges = resources.remove(&resource).unwrap_or_default();

        Ok(CheckPrivilegesResponse {
            has_all_requested: checked.has_all_requested,
            username: checked.username,
            privileges,
            cluster: checked.cluster,
        })
    }

    async fn check(
        &self,
        resources: Vec<String>,
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<Checked> {
        let login = self.actions.login().into_string();
        let version = self.actions.version().into_string();

        let all_privileges = uniq(
            [version.clone(), login.clone()]
                .into_iter()
                .chain(privileges.iter().cloned()),
        );
        let cluster = uniq(cluster_privileges.iter().cloned());

        let request = HasPrivilegesRequest {
            cluster: cluster.clone(),
            application: vec![ApplicationPrivilegesRequest {
                application: self.application.to_string(),
                resources: resources.clone(),
                privileges: all_privileges.clone(),
            }],
        };

        debug!(
            application = %self.application,
            resources = ?resources,
            privileges = all_privileges.len(),
            cluster = cluster.len(),
            "Checking privileges"
        );

        let response = self
            .transport
            .has_privileges(&self.context, &request)
            .await?;

        let (username, mut application) =
            self.validate(response.clone(), &resources, &all_privileges, &cluster)?;

        for (resource, actions) in &application {
            let has_login = actions.get(&login).copied().unwrap_or(false);
            let has_version = actions.get(&version).copied().unwrap_or(false);
            if has_login && !has_version {
                warn!(
                    resource = %resource,
                    version = %self.actions.version_number(),
                    "Login granted without matching version action"
                );
                return Err(AuthzError::VersionMismatch);
            }
        }

        let requested: HashSet<&str> = privileges.iter().map(String::as_str).collect();
        for actions in application.values_mut() {
            actions.retain(|action, _| requested.contains(action.as_str()));
        }

        Ok(Checked {
            has_all_requested: response.has_all_requested,
            username,
            resources: application,
            cluster: response.cluster,
        })
    }

    fn validate(
        &self,
        mut response: HasPrivilegesResponse,
        resources: &[String],
        privileges: &[String],
        cluster: &[String],
    ) -> Result<(String, ResourcePrivileges)> {
        let username = response
            .username
            .take()
            .ok_or_else(|| invalid("response is missing username"))?;

        let applications: BTreeSet<&str> =
            response.application.keys().map(String::as_str).collect();
        if applications != BTreeSet::from([&*self.application]) {
            return Err(invalid(format!(
                "expected application {}, got {:?}",
                self.application, applications
            )));
        }

        let cluster_keys: BTreeSet<&str> = response.cluster.keys().map(String::as_str).collect();
        if cluster_keys != as_set(cluster) {
            return Err(invalid(format!(
                "cluster privileges {:?} do not match request",
                cluster_keys
            )));
        }

        let application = response
            .application
            .remove(&*self.application)
            .unwrap_or_default();

        let resource_keys: BTreeSet<&str> = application.keys().map(String::as_str).collect();
        if resource_keys != as_set(resources) {
            return Err(invalid(format!(
                "resources {:?} do not match request",
                resource_keys
            )));
        }

        let expected = as_set(privileges);
        for (resource, actions) in &application {
            let keys: BTreeSet<&str> = actions.keys().map(String::as_str).collect();
            if keys != expected {
                return Err(invalid(format!(
                    "actions for resource {} do not match request",
                    resource
                )));
            }
        }

        Ok((username, application))
    }
}

fn invalid(reason: impl Into<String>) -> AuthzError {
    let reason = reason.into();
    warn!(reason = %reason, "Rejecting privilege check response");
    AuthzError::InvalidResponse(reason)
}

fn as_set(values: &[String]) -> BTreeSet<&str> {
    values.iter().map(String::as_str).collect()
}

fn uniq(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GrantingTransport;

    fn checker(transport: Arc<GrantingTransport>) -> CheckPrivileges {
        CheckPrivilegesFactory::new("kibana-.kibana", Actions::new("1.0.0"), transport)
            .with_request(RequestContext::new("default").with_authorization("Basic abc"))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_at_space_strips_implicit_actions() {
        let transport = Arc::new(GrantingTransport::new("elastic").grant("ui:dashboard/show"));
        let response = checker(transport.clone())
            .at_space("marketing", &strings(&["ui:dashboard/show", "ui:dashboard/save"]), &[])
            .await
            .unwrap();

        assert_eq!(response.username, "elastic");
        assert_eq!(response.privileges.len(), 2);
        assert!(response.is_granted("ui:dashboard/show"));
        assert!(!response.is_granted("ui:dashboard/save"));
        assert_eq!(response.missing(), vec!["ui:dashboard/save"]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let app = &requests[0].application[0];
        assert_eq!(app.resources, vec!["space:marketing"]);
        assert_eq!(
            app.privileges,
            vec!["version:1.0.0", "login:", "ui:dashboard/show", "ui:dashboard/save"]
        );
        assert_eq!(transport.authorizations(), vec![Some("Basic abc".to_string())]);
    }

    #[tokio::test]
    async fn test_explicit_login_is_kept() {
        let transport = Arc::new(GrantingTransport::new("elastic"));
        let response = checker(transport.clone())
            .globally(&strings(&["login:"]), &[])
            .await
            .unwrap();

        assert!(response.is_granted("login:"));
        assert_eq!(transport.requests()[0].application[0].resources, vec!["*"]);
        assert_eq!(transport.requests()[0].application[0].privileges.len(), 2);
    }

    #[tokio::test]
    async fn test_at_spaces_keys_by_space_id() {
        let transport = Arc::new(GrantingTransport::new("elastic").grant("api:read"));
        let response = checker(transport)
            .at_spaces(&strings(&["a", "b"]), &strings(&["api:read"]), &strings(&["monitor"]))
            .await
            .unwrap();

        assert_eq!(response.space_privileges.len(), 2);
        assert_eq!(response.space_privileges["a"]["api:read"], true);
        assert_eq!(response.cluster.get("monitor"), Some(&false));
    }

    #[tokio::test]
    async fn test_missing_action_is_invalid_response() {
        let transport =
            Arc::new(GrantingTransport::new("elastic").drop_action("ui:dashboard/save"));
        let err = checker(transport)
            .at_space("default", &strings(&["ui:dashboard/show", "ui:dashboard/save"]), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AuthzError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_username_is_invalid_response() {
        let transport = Arc::new(GrantingTransport::anonymous());
        let err = checker(transport)
            .globally(&strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AuthzError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_extra_action_is_invalid_response() {
        let transport = Arc::new(GrantingTransport::new("elastic").extra_action("extra:action"));
        let err = checker(transport)
            .at_space("default", &strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        match err {
            AuthzError::InvalidResponse(reason) => {
                assert_eq!(reason, "actions for resource space:default do not match request")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_resource_is_invalid_response() {
        let transport = Arc::new(GrantingTransport::new("elastic").extra_resource("space:other"));
        let err = checker(transport)
            .at_space("default", &strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        match err {
            AuthzError::InvalidResponse(reason) => assert!(reason.starts_with("resources ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_application_is_invalid_response() {
        let transport = Arc::new(GrantingTransport::new("elastic").extra_application("other-app"));
        let err = checker(transport)
            .globally(&strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        match err {
            AuthzError::InvalidResponse(reason) => {
                assert!(reason.starts_with("expected application kibana-.kibana"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cluster_mismatch_is_invalid_response() {
        let transport = Arc::new(GrantingTransport::new("elastic").extra_cluster("manage"));
        let err = checker(transport.clone())
            .globally(&strings(&["api:read"]), &strings(&["monitor"]))
            .await
            .unwrap_err();

        match err {
            AuthzError::InvalidResponse(reason) => {
                assert!(reason.starts_with("cluster privileges"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.requests()[0].cluster, vec!["monitor"]);
    }

    #[tokio::test]
    async fn test_login_without_version_fails() {
        let transport = Arc::new(GrantingTransport::new("elastic").deny("version:1.0.0"));
        let err = checker(transport)
            .at_space("default", &strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AuthzError::VersionMismatch));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let transport = Arc::new(
            GrantingTransport::new("elastic")
                .fail_with(crate::TransportError::Unauthorized("expired".into())),
        );
        let err = checker(transport)
            .globally(&strings(&["api:read"]), &[])
            .await
            .unwrap_err();

        assert!(err.transport().unwrap().is_auth_state());
    }
}
