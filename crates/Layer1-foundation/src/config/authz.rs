//! Authorization configuration
//!
//! Global (`<config_dir>/tessera/authz.json`) merged with project
//! (`.tessera/authz.json`); project values win.

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Config file name
pub const AUTHZ_CONFIG_FILE: &str = "authz.json";

/// Application name privileges are registered under
pub const DEFAULT_APPLICATION: &str = "kibana-.kibana";

fn default_application() -> String {
    DEFAULT_APPLICATION.to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retention_days() -> u32 {
    90
}

// ============================================================================
// AuthzConfig
// ============================================================================

/// Authorization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthzConfig {
    /// Application name sent with every privilege check
    #[serde(default = "default_application")]
    pub application: String,

    /// Deployment version embedded in the `version:` action
    #[serde(default = "default_version")]
    pub version: String,

    /// Check privileges per space instead of globally
    #[serde(default = "default_true")]
    pub spaces_enabled: bool,

    #[serde(default)]
    pub check_privileges: CheckPrivilegesConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            application: default_application(),
            version: default_version(),
            spaces_enabled: true,
            check_privileges: CheckPrivilegesConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AuthzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Global + project merged load
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<AuthzConfig>(AUTHZ_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.load_optional::<AuthzConfig>(AUTHZ_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// Load from a single store, falling back to defaults when absent
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store
            .load_optional::<AuthzConfig>(AUTHZ_CONFIG_FILE)?
            .unwrap_or_default())
    }

    pub fn save(&self, store: &JsonStore) -> Result<()> {
        store.save(AUTHZ_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Merge another config on top of this one (`other` wins)
    pub fn merge(&mut self, other: AuthzConfig) {
        if other.application != default_application() {
            self.application = other.application;
        }
        if other.version != default_version() {
            self.version = other.version;
        }
        if !other.spaces_enabled {
            self.spaces_enabled = false;
        }
        self.check_privileges.merge(other.check_privileges);
        self.audit.merge(other.audit);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn spaces_enabled(mut self, enabled: bool) -> Self {
        self.spaces_enabled = enabled;
        self
    }
}

// ============================================================================
// Check Privileges
// ============================================================================

/// Privilege-check service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPrivilegesConfig {
    /// Base URL of the privilege-check service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CheckPrivilegesConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CheckPrivilegesConfig {
    fn merge(&mut self, other: CheckPrivilegesConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_ms != default_timeout_ms() {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

// ============================================================================
// Audit
// ============================================================================

/// Audit persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite file; defaults to the local data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: None,
            retention_days: default_retention_days(),
        }
    }
}

impl AuditConfig {
    fn merge(&mut self, other: AuditConfig) {
        if !other.enabled {
            self.enabled = false;
        }
        if other.db_path.is_some() {
            self.db_path = other.db_path;
        }
        if other.retention_days != default_retention_days() {
            self.retention_days = other.retention_days;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthzConfig::new();
        assert_eq!(config.application, DEFAULT_APPLICATION);
        assert!(config.spaces_enabled);
        assert_eq!(config.check_privileges.timeout_ms, 30_000);
        assert_eq!(config.audit.retention_days, 90);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AuthzConfig =
            serde_json::from_str(r#"{ "version": "7.0.0", "spacesEnabled": false }"#).unwrap();
        assert_eq!(config.version, "7.0.0");
        assert!(!config.spaces_enabled);
        assert_eq!(config.application, DEFAULT_APPLICATION);
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = AuthzConfig::new().application("custom-app");
        let overlay: AuthzConfig = serde_json::from_str(
            r#"{ "version": "8.1.0", "checkPrivileges": { "baseUrl": "http://localhost:9200" } }"#,
        )
        .unwrap();

        base.merge(overlay);

        assert_eq!(base.application, "custom-app");
        assert_eq!(base.version, "8.1.0");
        assert_eq!(
            base.check_privileges.base_url.as_deref(),
            Some("http://localhost:9200")
        );
    }

    #[test]
    fn test_merge_keeps_disabled_flags() {
        let mut config: AuthzConfig = serde_json::from_str(
            r#"{ "spacesEnabled": false, "audit": { "enabled": false, "retentionDays": 30 } }"#,
        )
        .unwrap();
        let project: AuthzConfig = serde_json::from_str(r#"{ "version": "8.2.0" }"#).unwrap();

        config.merge(project);

        assert!(!config.spaces_enabled);
        assert!(!config.audit.enabled);
        assert_eq!(config.audit.retention_days, 30);
        assert_eq!(config.version, "8.2.0");
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert_eq!(AuthzConfig::load_from(&store).unwrap().application, DEFAULT_APPLICATION);

        AuthzConfig::new().version("9.9.9").save(&store).unwrap();
        assert_eq!(AuthzConfig::load_from(&store).unwrap().version, "9.9.9");
    }
}
