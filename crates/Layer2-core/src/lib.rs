//! tessera-core: authorization runtime for Tessera
//!
//! Layer2 - decisions and enforcement on top of the foundation types
//!
//! # Modules
//!
//! - `ranking`: orders privileges by action-set containment
//! - `effective`: effective privileges of a role, with explanations
//! - `check`: check-privileges client over a pluggable transport
//! - `capabilities`: projects a check result onto UI capabilities
//! - `secure`: authorizing decorator for saved-object repositories
//!
//! # Usage
//!
//! ```ignore
//! use tessera_core::{CheckPrivilegesFactory, HttpPrivilegeCheckTransport, RequestContext};
//!
//! let transport = Arc::new(HttpPrivilegeCheckTransport::from_config(&config.check_privileges)?);
//! let actions = Actions::new(&config.version);
//! let factory = CheckPrivilegesFactory::new(&config.application, actions, transport);
//!
//! let checker = factory.with_request(RequestContext::new("marketing").with_authorization(header));
//! let response = checker.at_space("marketing", &[action], &[]).await?;
//! ```

pub mod capabilities;
pub mod check;
pub mod effective;
pub mod error;
pub mod ranking;
pub mod secure;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports: Errors
pub use error::{AuthzError, Result, TransportError};

// Re-exports: Ranking
pub use ranking::{compare_actions, rank_by, rank_names, RankedPrivileges};

// Re-exports: Effective privileges
pub use effective::{
    EffectivePrivileges, EffectivePrivilegesFactory, PrivilegeExplanation, PrivilegeSource,
    GLOBAL_BASE_PRIVILEGE, GLOBAL_FEATURE_PRIVILEGE, SPACE_BASE_PRIVILEGE,
};

// Re-exports: Check privileges
pub use check::{
    CheckPrivileges, CheckPrivilegesAtSpacesResponse, CheckPrivilegesDynamically,
    CheckPrivilegesFactory, CheckPrivilegesResponse, HasPrivilegesRequest, HasPrivilegesResponse,
    HttpPrivilegeCheckTransport, PrivilegeCheckTransport, RequestContext, ResourceSerializer,
    GLOBAL_RESOURCE,
};

// Re-exports: UI capabilities
pub use capabilities::{DisableUiCapabilities, UiCapabilities};

// Re-exports: Secure access
pub use secure::{
    ConditionalPrivilege, ConditionalPrivileges, FindOptions, InMemorySavedObjectsRepository,
    Predicate, RepositoryOptions, SavedObject, SavedObjectsRepository, SecureSavedObjectsClient,
};
