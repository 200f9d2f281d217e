//! Privilege catalog and role assignments
//!
//! - `definition`: which privileges exist per scope and what they grant
//! - `role`: privileges assigned to a role at global and space scope

mod definition;
mod role;

pub use definition::{PrivilegeDefinition, PrivilegeSet, ALL, READ};
pub use role::{Role, SpacesPrivileges, GLOBAL_SPACE, NO_PRIVILEGE};

use crate::storage::JsonStore;
use crate::Result;

/// Load a role from `<store>/<filename>` and validate it against `definition`
pub fn load_role(
    store: &JsonStore,
    filename: &str,
    definition: &PrivilegeDefinition,
) -> Result<Role> {
    let role: Role = store.load(filename)?;
    role.validate(definition)?;
    Ok(role)
}
