//! Check privileges
//!
//! ```text
//! CheckPrivilegesFactory ──with_request──► CheckPrivileges
//!                                              │ at_space / at_spaces / globally
//!                                              ▼
//!                                  PrivilegeCheckTransport (one call)
//!                                              │
//!                                  validate ─► strip login/version
//! ```

mod client;
mod dynamic;
mod resource;
mod transport;
mod types;

pub use client::{CheckPrivileges, CheckPrivilegesFactory};
pub use dynamic::CheckPrivilegesDynamically;
pub use resource::{ResourceSerializer, GLOBAL_RESOURCE};
pub use transport::{HttpPrivilegeCheckTransport, PrivilegeCheckTransport};
pub use types::{
    ApplicationPrivilegesRequest, CheckPrivilegesAtSpacesResponse, CheckPrivilegesResponse,
    HasPrivilegesRequest, HasPrivilegesResponse, PrivilegeMap, RequestContext,
    ResourcePrivileges,
};
