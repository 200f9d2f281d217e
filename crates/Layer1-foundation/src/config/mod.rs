//! Config - authorization settings
//!
//! - `authz.rs` - AuthzConfig (application, version, spaces, privilege service, audit)

mod authz;

pub use authz::{
    AuditConfig, AuthzConfig, CheckPrivilegesConfig, AUTHZ_CONFIG_FILE, DEFAULT_APPLICATION,
};
