//! Feature descriptors and the feature-privileges builder
//!
//! - `types`: feature descriptors (Feature, FeaturePrivilege)
//! - `builder`: derives each feature privilege's action list

mod builder;
mod types;

pub use builder::{
    build_features_privileges, get_api_read_actions, get_ui_read_actions, FeaturesPrivileges,
};
pub use types::{Feature, FeaturePrivilege, SavedObjectGrants};

use crate::storage::JsonStore;
use crate::{Error, Result};
use std::collections::HashSet;

/// Feature descriptor file name
pub const FEATURES_FILE: &str = "features.json";

/// Load feature descriptors from `<store>/features.json`
pub fn load_features(store: &JsonStore) -> Result<Vec<Feature>> {
    let features: Vec<Feature> = store.load(FEATURES_FILE)?;
    validate_features(&features)?;
    tracing::debug!(count = features.len(), "Loaded feature descriptors");
    Ok(features)
}

/// Reject empty or duplicate feature ids
pub fn validate_features(features: &[Feature]) -> Result<()> {
    let mut seen = HashSet::new();
    for feature in features {
        if feature.id.is_empty() {
            return Err(Error::validation("feature id must not be empty"));
        }
        if !seen.insert(feature.id.as_str()) {
            return Err(Error::validation(format!(
                "feature '{}' is declared more than once",
                feature.id
            )));
        }
    }
    Ok(())
}
