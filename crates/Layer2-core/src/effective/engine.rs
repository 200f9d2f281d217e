//! Effective privileges engine
//!
//! The factory is built once per privilege definition and precomputes the
//! ranked privilege table plus the scope bridges (which feature privilege a
//! base privilege implies, which space privilege a global one implies).
//! Instances are cheap, per role, and never touch the caller's role.

use super::types::{
    PrivilegeExplanation, PrivilegeSource, GLOBAL_BASE_PRIVILEGE, GLOBAL_FEATURE_PRIVILEGE,
    SPACE_BASE_PRIVILEGE,
};
use crate::ranking::{rank_names, RankedPrivileges};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tessera_foundation::{
    Action, PrivilegeDefinition, PrivilegeSet, Role, SpacesPrivileges, NO_PRIVILEGE,
};

// ============================================================================
// Shared tables
// ============================================================================

/// base privilege -> feature id -> implied feature privilege
type BaseToFeature = HashMap<String, HashMap<String, String>>;

#[derive(Debug)]
struct Tables {
    ranked: RankedPrivileges,
    global_base_to_feature: BaseToFeature,
    space_base_to_feature: BaseToFeature,
    /// global base privilege -> implied space privilege
    global_base_to_space: HashMap<String, String>,
}

impl Tables {
    fn build(definition: &PrivilegeDefinition) -> Self {
        let ranked = RankedPrivileges::from_definition(definition);

        let global_base_to_feature =
            bridge_to_features(definition.global_privileges(), definition, &ranked);
        let space_base_to_feature =
            bridge_to_features(definition.space_privileges(), definition, &ranked);

        let global_base_to_space = definition
            .global_privileges()
            .iter()
            .filter_map(|(base, actions)| {
                most_permissive_contained(ranked.space(), definition.space_privileges(), actions)
                    .map(|space| (base.to_string(), space))
            })
            .collect();

        Self {
            ranked,
            global_base_to_feature,
            space_base_to_feature,
            global_base_to_space,
        }
    }
}

fn bridge_to_features(
    bases: &PrivilegeSet,
    definition: &PrivilegeDefinition,
    ranked: &RankedPrivileges,
) -> BaseToFeature {
    bases
        .iter()
        .map(|(base, base_actions)| {
            let implied = definition
                .features
                .iter()
                .filter_map(|(feature_id, set)| {
                    most_permissive_contained(ranked.feature(feature_id), set, base_actions)
                        .map(|privilege| (feature_id.clone(), privilege))
                })
                .collect();
            (base.to_string(), implied)
        })
        .collect()
}

/// First of `ranked_names` whose actions are all in `granted`
fn most_permissive_contained(
    ranked_names: &[String],
    set: &PrivilegeSet,
    granted: &[Action],
) -> Option<String> {
    let granted: HashSet<&Action> = granted.iter().collect();
    ranked_names
        .iter()
        .find(|name| {
            set.actions(name)
                .map(|actions| actions.iter().all(|a| granted.contains(a)))
                .unwrap_or(false)
        })
        .cloned()
}

// ============================================================================
// Factory
// ============================================================================

/// Builds per-role [`EffectivePrivileges`] over one privilege definition
#[derive(Debug, Clone)]
pub struct EffectivePrivilegesFactory {
    definition: Arc<PrivilegeDefinition>,
    tables: Arc<Tables>,
}

impl EffectivePrivilegesFactory {
    pub fn new(definition: Arc<PrivilegeDefinition>) -> Self {
        let tables = Arc::new(Tables::build(&definition));
        Self { definition, tables }
    }

    pub fn definition(&self) -> &PrivilegeDefinition {
        &self.definition
    }

    pub fn ranked(&self) -> &RankedPrivileges {
        &self.tables.ranked
    }

    /// Instance over a private, rank-sorted copy of `role`
    pub fn get_instance(&self, role: &Role) -> EffectivePrivileges {
        EffectivePrivileges {
            role: sorted_copy(role, &self.definition),
            definition: Arc::clone(&self.definition),
            tables: Arc::clone(&self.tables),
        }
    }
}

/// Clone `role` and sort every privilege list most permissive first
pub fn sorted_copy(role: &Role, definition: &PrivilegeDefinition) -> Role {
    let empty = PrivilegeSet::new();
    let mut copy = role.clone();

    for entry in &mut copy.privileges {
        let base_set = if entry.is_global() {
            definition.global_privileges()
        } else {
            definition.space_privileges()
        };
        rank_names(&mut entry.minimum, base_set);

        for (feature_id, privileges) in &mut entry.feature {
            let set = definition.feature_privileges(feature_id).unwrap_or(&empty);
            rank_names(privileges, set);
        }
    }

    copy
}

// ============================================================================
// Candidates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Direct,
    SpaceBase,
    GlobalFeature,
    GlobalBase,
}

impl Origin {
    fn label(&self) -> &'static str {
        match self {
            Origin::Direct => "assigned privilege",
            Origin::SpaceBase => SPACE_BASE_PRIVILEGE,
            Origin::GlobalFeature => GLOBAL_FEATURE_PRIVILEGE,
            Origin::GlobalBase => GLOBAL_BASE_PRIVILEGE,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    privilege: String,
    rank: usize,
    origin: Origin,
}

/// Pick the most permissive candidate; ties go to the earliest (narrowest)
fn winner(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .fold(None, |best: Option<&Candidate>, c| match best {
            Some(b) if b.rank <= c.rank => Some(b),
            _ => Some(c),
        })
}

fn explain(candidates: &[Candidate]) -> PrivilegeExplanation {
    let Some(win) = winner(candidates) else {
        return PrivilegeExplanation {
            privilege: NO_PRIVILEGE.to_string(),
            source: PrivilegeSource::None,
            superseded_privilege: None,
            override_source: None,
            details: "No privilege assigned".to_string(),
        };
    };

    let direct = candidates.iter().find(|c| c.origin == Origin::Direct);

    match direct {
        _ if win.origin == Origin::Direct => PrivilegeExplanation {
            privilege: win.privilege.clone(),
            source: PrivilegeSource::AssignedDirectly,
            superseded_privilege: None,
            override_source: None,
            details: format!("'{}' is assigned directly", win.privilege),
        },
        Some(direct) => PrivilegeExplanation {
            privilege: win.privilege.clone(),
            source: PrivilegeSource::EffectiveOverridesAssigned,
            superseded_privilege: Some(direct.privilege.clone()),
            override_source: Some(win.origin.label().to_string()),
            details: format!(
                "'{}' from the {} overrides the assigned '{}'",
                win.privilege,
                win.origin.label(),
                direct.privilege
            ),
        },
        None => PrivilegeExplanation {
            privilege: win.privilege.clone(),
            source: PrivilegeSource::Effective,
            superseded_privilege: None,
            override_source: None,
            details: format!("'{}' is granted by the {}", win.privilege, win.origin.label()),
        },
    }
}

// ============================================================================
// EffectivePrivileges
// ============================================================================

/// Effective privileges of one role
#[derive(Debug, Clone)]
pub struct EffectivePrivileges {
    role: Role,
    definition: Arc<PrivilegeDefinition>,
    tables: Arc<Tables>,
}

impl EffectivePrivileges {
    /// The sorted private copy this instance reads
    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn definition(&self) -> &PrivilegeDefinition {
        &self.definition
    }

    fn entry(&self, index: usize) -> &SpacesPrivileges {
        match self.role.privileges.get(index) {
            Some(entry) => entry,
            None => panic!(
                "privilege entry index {} out of range for role '{}' ({} entries)",
                index,
                self.role.name,
                self.role.privileges.len()
            ),
        }
    }

    fn global_entry(&self) -> Option<&SpacesPrivileges> {
        self.role.global_entry().map(|(_, entry)| entry)
    }

    fn feature_rank(&self, feature_id: &str, privilege: &str) -> usize {
        self.tables
            .ranked
            .feature_rank(feature_id, privilege)
            .unwrap_or(usize::MAX)
    }

    fn feature_candidate(&self, feature_id: &str, privilege: &str, origin: Origin) -> Candidate {
        Candidate {
            privilege: privilege.to_string(),
            rank: self.feature_rank(feature_id, privilege),
            origin,
        }
    }

    fn bridged_candidate(
        &self,
        table: &BaseToFeature,
        base: Option<&str>,
        feature_id: &str,
        origin: Origin,
    ) -> Option<Candidate> {
        let implied = table.get(base?)?.get(feature_id)?;
        Some(self.feature_candidate(feature_id, implied, origin))
    }

    fn global_feature_candidates(&self, feature_id: &str, include_direct: bool) -> Vec<Candidate> {
        let Some(global) = self.global_entry() else {
            return Vec::new();
        };

        let direct_origin = if include_direct {
            Origin::Direct
        } else {
            Origin::GlobalFeature
        };

        global
            .feature_privilege(feature_id)
            .map(|p| self.feature_candidate(feature_id, p, direct_origin))
            .into_iter()
            .chain(self.bridged_candidate(
                &self.tables.global_base_to_feature,
                global.base(),
                feature_id,
                Origin::GlobalBase,
            ))
            .collect()
    }

    /// Candidates narrowest first; the first is the direct assignment if any
    fn space_feature_candidates(&self, feature_id: &str, index: usize) -> Vec<Candidate> {
        let entry = self.entry(index);
        if entry.is_global() {
            return self.global_feature_candidates(feature_id, true);
        }

        let mut candidates: Vec<Candidate> = entry
            .feature_privilege(feature_id)
            .map(|p| self.feature_candidate(feature_id, p, Origin::Direct))
            .into_iter()
            .collect();

        candidates.extend(self.bridged_candidate(
            &self.tables.space_base_to_feature,
            entry.base(),
            feature_id,
            Origin::SpaceBase,
        ));
        candidates.extend(self.global_feature_candidates(feature_id, false));
        candidates
    }

    fn space_base_candidates(&self, index: usize) -> Vec<Candidate> {
        let ranked = &self.tables.ranked;
        let entry = self.entry(index);

        if entry.is_global() {
            return entry
                .base()
                .map(|base| Candidate {
                    privilege: base.to_string(),
                    rank: ranked.global_rank(base).unwrap_or(usize::MAX),
                    origin: Origin::Direct,
                })
                .into_iter()
                .collect();
        }

        let direct = entry.base().map(|base| Candidate {
            privilege: base.to_string(),
            rank: ranked.space_rank(base).unwrap_or(usize::MAX),
            origin: Origin::Direct,
        });

        let global = self
            .global_entry()
            .and_then(SpacesPrivileges::base)
            .and_then(|base| self.tables.global_base_to_space.get(base))
            .map(|space| Candidate {
                privilege: space.clone(),
                rank: ranked.space_rank(space).unwrap_or(usize::MAX),
                origin: Origin::GlobalBase,
            });

        direct.into_iter().chain(global).collect()
    }

    // ========================================================================
    // Explain
    // ========================================================================

    /// Effective privilege for `feature_id` at global scope
    pub fn explain_actual_global_feature_privilege(
        &self,
        feature_id: &str,
    ) -> PrivilegeExplanation {
        explain(&self.global_feature_candidates(feature_id, true))
    }

    /// Effective base privilege of the entry at `index`
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn explain_actual_space_base_privilege(&self, index: usize) -> PrivilegeExplanation {
        explain(&self.space_base_candidates(index))
    }

    /// Effective privilege for `feature_id` in the entry at `index`
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn explain_actual_space_feature_privilege(
        &self,
        feature_id: &str,
        index: usize,
    ) -> PrivilegeExplanation {
        explain(&self.space_feature_candidates(feature_id, index))
    }

    /// Explanations for every feature of the definition in the entry at `index`
    pub fn explain_space_features(&self, index: usize) -> Vec<(String, PrivilegeExplanation)> {
        self.tables
            .ranked
            .feature_ids()
            .map(|feature_id| {
                (
                    feature_id.to_string(),
                    self.explain_actual_space_feature_privilege(feature_id, index),
                )
            })
            .collect()
    }

    // ========================================================================
    // Get
    // ========================================================================

    pub fn get_actual_global_feature_privilege(&self, feature_id: &str) -> String {
        self.explain_actual_global_feature_privilege(feature_id)
            .privilege
    }

    pub fn get_actual_space_base_privilege(&self, index: usize) -> String {
        self.explain_actual_space_base_privilege(index).privilege
    }

    pub fn get_actual_space_feature_privilege(&self, feature_id: &str, index: usize) -> String {
        self.explain_actual_space_feature_privilege(feature_id, index)
            .privilege
    }

    // ========================================================================
    // Assignability
    // ========================================================================

    /// Whether assigning `candidate` directly would change anything
    ///
    /// False when a broader scope already yields something at least as
    /// permissive, or when `candidate` is not a privilege of the feature.
    pub fn can_assign_space_feature_privilege(
        &self,
        feature_id: &str,
        candidate: &str,
        index: usize,
    ) -> bool {
        let inherited: Vec<Candidate> = self
            .space_feature_candidates(feature_id, index)
            .into_iter()
            .filter(|c| c.origin != Origin::Direct)
            .collect();
        self.assignable(feature_id, candidate, &inherited)
    }

    /// Global counterpart of [`Self::can_assign_space_feature_privilege`]
    pub fn can_assign_global_feature_privilege(&self, feature_id: &str, candidate: &str) -> bool {
        let inherited: Vec<Candidate> = self
            .global_feature_candidates(feature_id, true)
            .into_iter()
            .filter(|c| c.origin != Origin::Direct)
            .collect();
        self.assignable(feature_id, candidate, &inherited)
    }

    fn assignable(&self, feature_id: &str, candidate: &str, inherited: &[Candidate]) -> bool {
        let Some(candidate_rank) = self.tables.ranked.feature_rank(feature_id, candidate) else {
            return false;
        };
        match winner(inherited) {
            Some(best) => best.rank > candidate_rank,
            None => true,
        }
    }
}
