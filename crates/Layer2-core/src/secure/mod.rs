//! Secure saved-object access
//!
//! [`SecureSavedObjectsClient`] sits in front of a [`SavedObjectsRepository`]
//! and turns each call into one privilege check. Types with conditional
//! privileges may be granted access restricted by a [`Predicate`] that is
//! handed down to the repository.

mod client;
mod conditions;
mod memory;
mod predicate;
mod repository;

pub use client::SecureSavedObjectsClient;
pub use conditions::{Condition, ConditionValue, ConditionalPrivilege, ConditionalPrivileges};
pub use memory::InMemorySavedObjectsRepository;
pub use predicate::Predicate;
pub use repository::{
    merge_attributes, BulkCreateObject, BulkGetObject, BulkUpdateObject, FindOptions,
    FindResponse, RepositoryOptions, SavedObject, SavedObjectsRepository, DEFAULT_SPACE_ID,
};
