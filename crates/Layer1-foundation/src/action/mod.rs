//! Action catalog
//!
//! Builds the namespaced action identifiers that are checked against the
//! external privilege-check service:
//!
//! | Namespace | Format |
//! |-----------|--------|
//! | login | `login:` |
//! | version | `version:<version>` |
//! | api | `api:<operation>` |
//! | app | `app:<app id>` |
//! | ui | `ui:<feature>/<capability>` |
//! | saved object | `saved_object:<type>/<operation>` |
//! | conditional saved object | `saved_object:<type>/<operation>/<condition>` |
//! | space | `space:manage` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Saved-object operations granted by a `read` grant
pub const READ_OPERATIONS: &[&str] = &["bulk_get", "get", "find"];

/// Saved-object operations granted by an `all` grant
pub const ALL_OPERATIONS: &[&str] = &[
    "bulk_get",
    "get",
    "find",
    "create",
    "bulk_create",
    "update",
    "bulk_update",
    "delete",
];

/// UI category holding navigation links
pub const NAV_LINKS: &str = "navLinks";
/// UI category holding management sections
pub const MANAGEMENT: &str = "management";
/// UI category holding catalogue entries
pub const CATALOGUE: &str = "catalogue";

// ============================================================================
// Action
// ============================================================================

/// A single namespaced action identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Action {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.0
    }
}

impl PartialEq<str> for Action {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Action {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Action factory bound to one deployment version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actions {
    version: String,
}

impl Actions {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version_number(&self) -> &str {
        &self.version
    }

    /// `login:`
    pub fn login(&self) -> Action {
        Action("login:".to_string())
    }

    /// `version:<version>`
    pub fn version(&self) -> Action {
        Action(format!("version:{}", self.version))
    }

    pub fn api(&self, operation: &str) -> Action {
        Action(format!("api:{}", operation))
    }

    pub fn app(&self, app_id: &str) -> Action {
        Action(format!("app:{}", app_id))
    }

    /// `ui:<feature>/<part>/<part>...`
    pub fn ui(&self, feature_id: &str, parts: &[&str]) -> Action {
        let mut action = format!("ui:{}", feature_id);
        for part in parts {
            action.push('/');
            action.push_str(part);
        }
        Action(action)
    }

    pub fn nav_link(&self, nav_link_id: &str) -> Action {
        self.ui(NAV_LINKS, &[nav_link_id])
    }

    pub fn catalogue(&self, entry: &str) -> Action {
        self.ui(CATALOGUE, &[entry])
    }

    pub fn management(&self, section: &str, entry: &str) -> Action {
        self.ui(MANAGEMENT, &[section, entry])
    }

    pub fn saved_object(&self, object_type: &str, operation: &str) -> Action {
        Action(format!("saved_object:{}/{}", object_type, operation))
    }

    /// Action gating a named conditional grant on a saved-object operation
    pub fn saved_object_conditional(
        &self,
        object_type: &str,
        operation: &str,
        condition: &str,
    ) -> Action {
        Action(format!(
            "saved_object:{}/{}/{}",
            object_type, operation, condition
        ))
    }

    /// Every saved-object operation for `object_type`
    pub fn saved_object_all(&self, object_type: &str) -> Vec<Action> {
        ALL_OPERATIONS
            .iter()
            .map(|op| self.saved_object(object_type, op))
            .collect()
    }

    /// Read-only saved-object operations for `object_type`
    pub fn saved_object_read(&self, object_type: &str) -> Vec<Action> {
        READ_OPERATIONS
            .iter()
            .map(|op| self.saved_object(object_type, op))
            .collect()
    }

    /// `space:manage`
    pub fn space_manage(&self) -> Action {
        Action("space:manage".to_string())
    }

    /// Wrap a raw identifier, e.g. one echoed back by the privilege service
    pub fn raw(&self, value: impl Into<String>) -> Action {
        Action(value.into())
    }
}
