//! Privilege-check wire and result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// action -> granted
pub type PrivilegeMap = BTreeMap<String, bool>;

/// resource -> action -> granted
pub type ResourcePrivileges = BTreeMap<String, PrivilegeMap>;

/// Caller-side data carried into a check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Forwarded verbatim as the `Authorization` header
    pub authorization: Option<String>,

    /// Space the request targets
    pub space_id: String,
}

impl RequestContext {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            authorization: None,
            space_id: space_id.into(),
        }
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationPrivilegesRequest {
    pub application: String,
    pub resources: Vec<String>,
    pub privileges: Vec<String>,
}

/// Body of a `_has_privileges` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasPrivilegesRequest {
    pub cluster: Vec<String>,
    pub application: Vec<ApplicationPrivilegesRequest>,
}

/// Answer of a `_has_privileges` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasPrivilegesResponse {
    #[serde(default)]
    pub has_all_requested: bool,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub cluster: PrivilegeMap,

    /// application -> resource -> action -> granted
    #[serde(default)]
    pub application: BTreeMap<String, ResourcePrivileges>,
}

// ============================================================================
// Results
// ============================================================================

/// Result of a single-resource check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPrivilegesResponse {
    pub has_all_requested: bool,
    pub username: String,
    pub privileges: PrivilegeMap,
    pub cluster: PrivilegeMap,
}

impl CheckPrivilegesResponse {
    pub fn is_granted(&self, action: &str) -> bool {
        self.privileges.get(action).copied().unwrap_or(false)
    }

    pub fn is_cluster_granted(&self, privilege: &str) -> bool {
        self.cluster.get(privilege).copied().unwrap_or(false)
    }

    /// Requested actions that were denied
    pub fn missing(&self) -> Vec<String> {
        self.privileges
            .iter()
            .filter(|(_, granted)| !**granted)
            .map(|(action, _)| action.clone())
            .collect()
    }
}

/// Result of a multi-space check, keyed by space id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPrivilegesAtSpacesResponse {
    pub has_all_requested: bool,
    pub username: String,
    pub space_privileges: ResourcePrivileges,
    pub cluster: PrivilegeMap,
}
