//! Test doubles shared by the inline test modules

use crate::check::{
    HasPrivilegesRequest, HasPrivilegesResponse, PrivilegeCheckTransport, RequestContext,
};
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tessera_foundation::AuditSink;

/// Answers every request well-formed, granting only what it was told to
pub(crate) struct GrantingTransport {
    username: Option<String>,
    granted: HashSet<String>,
    denied: HashSet<String>,
    cluster_granted: HashSet<String>,
    dropped: HashSet<String>,
    extra_actions: Vec<String>,
    extra_resources: Vec<String>,
    extra_cluster: Vec<String>,
    extra_application: Option<String>,
    failure: Option<TransportError>,
    calls: Mutex<Vec<(RequestContext, HasPrivilegesRequest)>>,
}

impl GrantingTransport {
    pub fn new(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            granted: HashSet::new(),
            denied: HashSet::new(),
            cluster_granted: HashSet::new(),
            dropped: HashSet::new(),
            extra_actions: Vec::new(),
            extra_resources: Vec::new(),
            extra_cluster: Vec::new(),
            extra_application: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            username: None,
            ..Self::new("")
        }
    }

    pub fn grant(mut self, action: &str) -> Self {
        self.granted.insert(action.to_string());
        self
    }

    pub fn grant_all(mut self, actions: &[&str]) -> Self {
        self.granted.extend(actions.iter().map(|a| a.to_string()));
        self
    }

    /// Deny an action that would otherwise be granted (`login:`, `version:*`)
    pub fn deny(mut self, action: &str) -> Self {
        self.denied.insert(action.to_string());
        self
    }

    pub fn grant_cluster(mut self, privilege: &str) -> Self {
        self.cluster_granted.insert(privilege.to_string());
        self
    }

    /// Leave `action` out of the response
    pub fn drop_action(mut self, action: &str) -> Self {
        self.dropped.insert(action.to_string());
        self
    }

    /// Answer with an action nobody asked for on every resource
    pub fn extra_action(mut self, action: &str) -> Self {
        self.extra_actions.push(action.to_string());
        self
    }

    pub fn extra_resource(mut self, resource: &str) -> Self {
        self.extra_resources.push(resource.to_string());
        self
    }

    pub fn extra_cluster(mut self, privilege: &str) -> Self {
        self.extra_cluster.push(privilege.to_string());
        self
    }

    /// Answer for `application` as well as the requested one
    pub fn extra_application(mut self, application: &str) -> Self {
        self.extra_application = Some(application.to_string());
        self
    }

    pub fn fail_with(mut self, error: TransportError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn requests(&self) -> Vec<HasPrivilegesRequest> {
        self.calls.lock().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .iter()
            .map(|(c, _)| c.authorization.clone())
            .collect()
    }

    fn is_granted(&self, action: &str) -> bool {
        if self.denied.contains(action) {
            return false;
        }
        action == "login:" || action.starts_with("version:") || self.granted.contains(action)
    }
}

#[async_trait]
impl PrivilegeCheckTransport for GrantingTransport {
    async fn has_privileges(
        &self,
        context: &RequestContext,
        request: &HasPrivilegesRequest,
    ) -> Result<HasPrivilegesResponse, TransportError> {
        self.calls.lock().push((context.clone(), request.clone()));

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let mut has_all_requested = true;
        let mut application = BTreeMap::new();

        for app in &request.application {
            let mut resources = BTreeMap::new();
            for resource in app.resources.iter().chain(&self.extra_resources) {
                let mut actions = BTreeMap::new();
                for action in app.privileges.iter().filter(|a| !self.dropped.contains(*a)) {
                    let granted = self.is_granted(action);
                    has_all_requested &= granted;
                    actions.insert(action.clone(), granted);
                }
                for action in &self.extra_actions {
                    actions.insert(action.clone(), true);
                }
                resources.insert(resource.clone(), actions);
            }
            if let Some(other) = &self.extra_application {
                application.insert(other.clone(), resources.clone());
            }
            application.insert(app.application.clone(), resources);
        }

        let cluster = request
            .cluster
            .iter()
            .chain(&self.extra_cluster)
            .map(|p| {
                let granted = self.cluster_granted.contains(p);
                has_all_requested &= granted;
                (p.clone(), granted)
            })
            .collect();

        Ok(HasPrivilegesResponse {
            has_all_requested,
            username: self.username.clone(),
            cluster,
            application,
        })
    }
}

/// Keeps the action name of every audit event
#[derive(Default)]
pub(crate) struct RecordingAuditSink {
    successes: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingAuditSink {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn authorization_success(
        &self,
        _username: &str,
        action: &str,
        _types: &[String],
        _context: &Value,
    ) {
        self.successes.lock().push(action.to_string());
    }

    fn authorization_failure(
        &self,
        _username: &str,
        action: &str,
        _types: &[String],
        _missing_actions: &[String],
        _context: &Value,
    ) {
        self.failures.lock().push(action.to_string());
    }
}
