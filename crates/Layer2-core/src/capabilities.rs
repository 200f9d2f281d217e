//! UI capability projection
//!
//! Turns a check-privileges result into a capability tree where every leaf
//! the principal is not granted is switched off. Leaves are only ever
//! switched off, never back on.

use crate::check::CheckPrivilegesDynamically;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tessera_foundation::{Actions, Feature};
use tracing::{debug, warn};

/// capability -> enabled
pub type CapabilityMap = BTreeMap<String, bool>;

/// Presentation capabilities of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiCapabilities {
    #[serde(default)]
    pub nav_links: CapabilityMap,

    /// section -> entry -> enabled
    #[serde(default)]
    pub management: BTreeMap<String, CapabilityMap>,

    #[serde(default)]
    pub catalogue: CapabilityMap,

    /// feature -> capability -> enabled
    #[serde(flatten)]
    pub features: BTreeMap<String, CapabilityMap>,
}

impl UiCapabilities {
    fn for_each_leaf(&mut self, mut f: impl FnMut(Leaf<'_>, &mut bool)) {
        for (id, enabled) in self.nav_links.iter_mut() {
            f(Leaf::NavLink(id), enabled);
        }
        for (section, entries) in self.management.iter_mut() {
            for (entry, enabled) in entries.iter_mut() {
                f(Leaf::Management(section, entry), enabled);
            }
        }
        for (entry, enabled) in self.catalogue.iter_mut() {
            f(Leaf::Catalogue(entry), enabled);
        }
        for (feature, capabilities) in self.features.iter_mut() {
            for (capability, enabled) in capabilities.iter_mut() {
                f(Leaf::Feature(feature, capability), enabled);
            }
        }
    }

    /// Number of enabled leaves
    pub fn enabled_count(&self) -> usize {
        let count = |map: &CapabilityMap| map.values().filter(|v| **v).count();
        count(&self.nav_links)
            + count(&self.catalogue)
            + self.management.values().map(count).sum::<usize>()
            + self.features.values().map(count).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy)]
enum Leaf<'a> {
    NavLink(&'a str),
    Management(&'a str, &'a str),
    Catalogue(&'a str),
    Feature(&'a str, &'a str),
}

impl Leaf<'_> {
    fn action(&self, actions: &Actions) -> String {
        match *self {
            Leaf::NavLink(id) => actions.nav_link(id),
            Leaf::Management(section, entry) => actions.management(section, entry),
            Leaf::Catalogue(entry) => actions.catalogue(entry),
            Leaf::Feature(feature, capability) => actions.ui(feature, &[capability]),
        }
        .into_string()
    }
}

/// Disables UI capabilities the principal is not granted
pub struct DisableUiCapabilities {
    features: Arc<Vec<Feature>>,
    actions: Actions,
    checker: CheckPrivilegesDynamically,
}

impl DisableUiCapabilities {
    pub fn new(
        features: Arc<Vec<Feature>>,
        actions: Actions,
        checker: CheckPrivilegesDynamically,
    ) -> Self {
        Self {
            features,
            actions,
            checker,
        }
    }

    /// Every leaf off
    pub fn disable_all(&self, mut capabilities: UiCapabilities) -> UiCapabilities {
        capabilities.for_each_leaf(|_, enabled| *enabled = false);
        capabilities
    }

    /// Leaves stay on only when their UI action is granted
    ///
    /// A 401/403 from the check itself disables everything; any other
    /// failure is returned.
    pub async fn using_privileges(
        &self,
        mut capabilities: UiCapabilities,
    ) -> Result<UiCapabilities> {
        let mut ui_actions = Vec::new();
        capabilities.for_each_leaf(|leaf, _| ui_actions.push(leaf.action(&self.actions)));

        let mut seen = HashSet::new();
        let cluster_privileges: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.required_cluster_privileges.iter().cloned())
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let response = match self.checker.check(&ui_actions, &cluster_privileges).await {
            Ok(response) => response,
            Err(e) if e.transport().is_some_and(|t| t.is_auth_state()) => {
                warn!(
                    error = %e,
                    "Privilege check rejected the principal, disabling all capabilities"
                );
                return Ok(self.disable_all(capabilities));
            }
            Err(e) => return Err(e),
        };

        let gated_nav_links: HashSet<&str> = self
            .features
            .iter()
            .filter(|f| {
                f.required_cluster_privileges
                    .iter()
                    .any(|p| !response.is_cluster_granted(p))
            })
            .filter_map(|f| f.nav_link_id.as_deref())
            .collect();

        capabilities.for_each_leaf(|leaf, enabled| {
            if !*enabled {
                return;
            }
            let cluster_gated = matches!(leaf, Leaf::NavLink(id) if gated_nav_links.contains(id));
            *enabled = response.is_granted(&leaf.action(&self.actions)) && !cluster_gated;
        });

        debug!(
            username = %response.username,
            enabled = capabilities.enabled_count(),
            "Projected UI capabilities"
        );

        Ok(capabilities)
    }
}
