//! Effective privileges
//!
//! Answers "what does this role actually get for feature X in space entry
//! N, and why" by resolving the direct assignment against the space base,
//! global feature and global base privileges.

mod engine;
mod types;

pub use engine::{sorted_copy, EffectivePrivileges, EffectivePrivilegesFactory};
pub use types::{
    PrivilegeExplanation, PrivilegeSource, GLOBAL_BASE_PRIVILEGE, GLOBAL_FEATURE_PRIVILEGE,
    SPACE_BASE_PRIVILEGE,
};
