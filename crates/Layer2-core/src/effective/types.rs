//! Effective privilege explanation types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Override source label: the role's global base privilege
pub const GLOBAL_BASE_PRIVILEGE: &str = "global base privilege";
/// Override source label: the role's global feature privilege
pub const GLOBAL_FEATURE_PRIVILEGE: &str = "global feature privilege";
/// Override source label: the space entry's base privilege
pub const SPACE_BASE_PRIVILEGE: &str = "space base privilege";

/// Where an effective privilege comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivilegeSource {
    /// Nothing is granted
    None,
    /// The privilege assigned at this scope is the effective one
    AssignedDirectly,
    /// Inherited from a broader scope, nothing assigned here
    Effective,
    /// A broader scope grants more than what is assigned here
    EffectiveOverridesAssigned,
}

impl PrivilegeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AssignedDirectly => "ASSIGNED_DIRECTLY",
            Self::Effective => "EFFECTIVE",
            Self::EffectiveOverridesAssigned => "EFFECTIVE_OVERRIDES_ASSIGNED",
        }
    }
}

impl fmt::Display for PrivilegeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The actually-granted privilege and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeExplanation {
    pub privilege: String,

    pub source: PrivilegeSource,

    /// Directly assigned privilege that lost to a broader scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_privilege: Option<String>,

    /// Which broader scope won
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_source: Option<String>,

    pub details: String,
}

impl PrivilegeExplanation {
    pub fn is_granted(&self) -> bool {
        self.source != PrivilegeSource::None
    }
}
