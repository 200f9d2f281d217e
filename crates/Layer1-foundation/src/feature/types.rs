//! Feature descriptors
//!
//! A feature is a named capability unit that declares its privilege levels
//! ("all", "read", ...) and what each level grants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// Saved-object types granted by one feature privilege
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedObjectGrants {
    /// Types granted every operation
    #[serde(default)]
    pub all: Vec<String>,

    /// Types granted read operations only
    #[serde(default)]
    pub read: Vec<String>,
}

/// What one named privilege of a feature grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePrivilege {
    #[serde(default)]
    pub api: Vec<String>,

    #[serde(default)]
    pub app: Vec<String>,

    #[serde(default)]
    pub saved_object: SavedObjectGrants,

    /// UI capabilities of the owning feature
    #[serde(default)]
    pub ui: Vec<String>,

    #[serde(default)]
    pub catalogue: Vec<String>,

    /// Management section -> entries
    #[serde(default)]
    pub management: BTreeMap<String, Vec<String>>,

    /// Whether this privilege enables the feature's navigation link
    #[serde(default = "default_true")]
    pub nav_link: bool,
}

impl Default for FeaturePrivilege {
    fn default() -> Self {
        Self {
            api: Vec::new(),
            app: Vec::new(),
            saved_object: SavedObjectGrants::default(),
            ui: Vec::new(),
            catalogue: Vec::new(),
            management: BTreeMap::new(),
            nav_link: true,
        }
    }
}

impl FeaturePrivilege {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api(mut self, operations: &[&str]) -> Self {
        self.api.extend(operations.iter().map(|s| s.to_string()));
        self
    }

    pub fn app(mut self, apps: &[&str]) -> Self {
        self.app.extend(apps.iter().map(|s| s.to_string()));
        self
    }

    pub fn saved_object_all(mut self, types: &[&str]) -> Self {
        self.saved_object
            .all
            .extend(types.iter().map(|s| s.to_string()));
        self
    }

    pub fn saved_object_read(mut self, types: &[&str]) -> Self {
        self.saved_object
            .read
            .extend(types.iter().map(|s| s.to_string()));
        self
    }

    pub fn ui(mut self, capabilities: &[&str]) -> Self {
        self.ui.extend(capabilities.iter().map(|s| s.to_string()));
        self
    }

    pub fn catalogue(mut self, entries: &[&str]) -> Self {
        self.catalogue.extend(entries.iter().map(|s| s.to_string()));
        self
    }

    pub fn management(mut self, section: &str, entries: &[&str]) -> Self {
        self.management
            .entry(section.to_string())
            .or_default()
            .extend(entries.iter().map(|s| s.to_string()));
        self
    }

    pub fn without_nav_link(mut self) -> Self {
        self.nav_link = false;
        self
    }
}

/// Feature descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub app: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_link_id: Option<String>,

    #[serde(default)]
    pub catalogue: Vec<String>,

    #[serde(default)]
    pub management: BTreeMap<String, Vec<String>>,

    /// Cluster privileges the principal needs before the nav link is shown
    #[serde(default)]
    pub required_cluster_privileges: Vec<String>,

    /// Keep this feature's actions out of the global/space base privileges
    #[serde(default)]
    pub exclude_from_base_privileges: bool,

    /// Privilege name -> grants
    #[serde(default)]
    pub privileges: BTreeMap<String, FeaturePrivilege>,
}

impl Feature {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            app: Vec::new(),
            nav_link_id: None,
            catalogue: Vec::new(),
            management: BTreeMap::new(),
            required_cluster_privileges: Vec::new(),
            exclude_from_base_privileges: false,
            privileges: BTreeMap::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn nav_link_id(mut self, nav_link_id: impl Into<String>) -> Self {
        self.nav_link_id = Some(nav_link_id.into());
        self
    }

    pub fn required_cluster_privileges(mut self, privileges: &[&str]) -> Self {
        self.required_cluster_privileges = privileges.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn exclude_from_base_privileges(mut self) -> Self {
        self.exclude_from_base_privileges = true;
        self
    }

    pub fn privilege(mut self, name: impl Into<String>, privilege: FeaturePrivilege) -> Self {
        self.privileges.insert(name.into(), privilege);
        self
    }

    /// The feature's `read` privilege, if declared
    pub fn read_privilege(&self) -> Option<&FeaturePrivilege> {
        self.privileges.get("read")
    }
}
