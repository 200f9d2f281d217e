//! # tessera-foundation
//!
//! Foundation layer for Tessera:
//! - Action: namespaced action identifiers (login, version, api, app, ui, saved objects)
//! - Feature: feature descriptors and the feature-privileges builder
//! - Privilege: privilege definition (global / space / feature) and role assignments
//! - Audit: audit sink trait, tracing sink, SQLite audit logger
//! - Config: AuthzConfig (global + project merged)
//! - Storage: JsonStore for config, features, and roles
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Feature descriptors (features.json)                 │
//! │                     │                                │
//! │                     ▼                                │
//! │  build_features_privileges ──► PrivilegeDefinition   │
//! │                                  (global/space/feat) │
//! │                                        │             │
//! │                  Role ─────────────────┤             │
//! │                                        ▼             │
//! │                     tessera-core (ranking, effective │
//! │                     privileges, enforcement)         │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod audit;
pub mod config;
pub mod error;
pub mod feature;
pub mod privilege;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Actions
// ============================================================================
pub use action::{Action, Actions, ALL_OPERATIONS, READ_OPERATIONS};

// ============================================================================
// Features
// ============================================================================
pub use feature::{
    build_features_privileges, get_api_read_actions, get_ui_read_actions, load_features,
    Feature, FeaturePrivilege, FeaturesPrivileges, SavedObjectGrants, FEATURES_FILE,
};

// ============================================================================
// Privileges
// ============================================================================
pub use privilege::{
    load_role, PrivilegeDefinition, PrivilegeSet, Role, SpacesPrivileges, GLOBAL_SPACE,
    NO_PRIVILEGE,
};

// ============================================================================
// Audit
// ============================================================================
pub use audit::{
    AuditEntry, AuditEvent, AuditLogger, AuditLoggerConfig, AuditQuery, AuditSink,
    CompositeAuditSink, TracingAuditSink,
};

// ============================================================================
// Config / Storage
// ============================================================================
pub use config::{AuditConfig, AuthzConfig, CheckPrivilegesConfig, AUTHZ_CONFIG_FILE};
pub use storage::JsonStore;
