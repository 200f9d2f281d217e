//! Subcommand implementations
//!
//! Each command returns its rendered output; `main` prints it.

use anyhow::{bail, Context};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tessera_core::{
    CheckPrivilegesDynamically, CheckPrivilegesFactory, EffectivePrivilegesFactory,
    HttpPrivilegeCheckTransport, PrivilegeExplanation, PrivilegeSource, RankedPrivileges,
    RequestContext,
};
use tessera_foundation::feature::validate_features;
use tessera_foundation::{
    load_role, Actions, AuditEvent, AuditLogger, AuditQuery, AuthzConfig,
    Feature, JsonStore, PrivilegeDefinition, PrivilegeSet, Role,
};

// ============================================================================
// Loading
// ============================================================================

/// Split a file path into its store directory and file name
fn store_for(path: &Path) -> anyhow::Result<(JsonStore, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    Ok((JsonStore::new(dir), name.to_string()))
}

fn load_features_file(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let (store, name) = store_for(path)?;
    let features: Vec<Feature> = store
        .load(&name)
        .with_context(|| format!("Failed to load features from {}", path.display()))?;
    validate_features(&features)?;
    Ok(features)
}

fn load_definition(features: &Path, version: &str) -> anyhow::Result<PrivilegeDefinition> {
    let features = load_features_file(features)?;
    Ok(PrivilegeDefinition::build(&features, &Actions::new(version)))
}

fn load_role_file(path: &Path, definition: &PrivilegeDefinition) -> anyhow::Result<Role> {
    let (store, name) = store_for(path)?;
    load_role(&store, &name, definition)
        .with_context(|| format!("Failed to load role from {}", path.display()))
}

// ============================================================================
// definition / rank
// ============================================================================

pub fn definition(features: &Path, json: bool) -> anyhow::Result<String> {
    let config = AuthzConfig::load()?;
    let definition = load_definition(features, &config.version)?;
    render_definition(&definition, json)
}

fn render_definition(definition: &PrivilegeDefinition, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(definition)?);
    }

    let mut out = String::new();
    write_set(&mut out, "global", definition.global_privileges());
    write_set(&mut out, "space", definition.space_privileges());
    for (feature_id, set) in &definition.features {
        write_set(&mut out, &format!("feature {}", feature_id), set);
    }
    Ok(out.trim_end().to_string())
}

fn write_set(out: &mut String, title: &str, set: &PrivilegeSet) {
    let _ = writeln!(out, "{}:", title);
    for (name, actions) in set.iter() {
        let _ = writeln!(out, "  {} ({} actions)", name, actions.len());
    }
}

pub fn rank(features: &Path, json: bool) -> anyhow::Result<String> {
    let config = AuthzConfig::load()?;
    let definition = load_definition(features, &config.version)?;
    render_rank(&RankedPrivileges::from_definition(&definition), json)
}

fn render_rank(ranked: &RankedPrivileges, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(ranked)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "global: {}", ranked.global().join(" > "));
    let _ = writeln!(out, "space: {}", ranked.space().join(" > "));
    for feature_id in ranked.feature_ids() {
        let _ = writeln!(out, "{}: {}", feature_id, ranked.feature(feature_id).join(" > "));
    }
    Ok(out.trim_end().to_string())
}

// ============================================================================
// explain
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryExplanation {
    index: usize,
    spaces: Vec<String>,
    base: PrivilegeExplanation,
    features: BTreeMap<String, PrivilegeExplanation>,
    /// Shown for a space that only the global entry covers
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    inherited: bool,
}

pub fn explain(
    features: &Path,
    role: &Path,
    space: Option<&str>,
    json: bool,
) -> anyhow::Result<String> {
    let config = AuthzConfig::load()?;
    let definition = load_definition(features, &config.version)?;
    let role = load_role_file(role, &definition)?;

    let entries = explain_role(definition, &role, space)?;
    render_explanations(&role.name, &entries, json)
}

fn explain_role(
    definition: PrivilegeDefinition,
    role: &Role,
    space: Option<&str>,
) -> anyhow::Result<Vec<EntryExplanation>> {
    let factory = EffectivePrivilegesFactory::new(Arc::new(definition));
    let effective = factory.get_instance(role);

    let Some(space_id) = space else {
        return Ok(role
            .sorted_for_display()
            .into_iter()
            .map(|(index, _)| EntryExplanation {
                index,
                spaces: role.privileges[index].spaces.clone(),
                base: effective.explain_actual_space_base_privilege(index),
                features: effective.explain_space_features(index).into_iter().collect(),
                inherited: false,
            })
            .collect());
    };

    if let Some(index) = role.entry_index_for_space(space_id) {
        return Ok(vec![EntryExplanation {
            index,
            spaces: role.privileges[index].spaces.clone(),
            base: effective.explain_actual_space_base_privilege(index),
            features: effective.explain_space_features(index).into_iter().collect(),
            inherited: false,
        }]);
    }

    let Some((index, _)) = role.global_entry() else {
        bail!("Role '{}' has no privileges in space '{}'", role.name, space_id);
    };

    Ok(vec![EntryExplanation {
        index,
        spaces: vec![space_id.to_string()],
        base: inherited(effective.explain_actual_space_base_privilege(index)),
        features: effective
            .explain_space_features(index)
            .into_iter()
            .map(|(feature_id, explanation)| (feature_id, inherited(explanation)))
            .collect(),
        inherited: true,
    }])
}

/// Re-label a global entry's explanation for a space without its own entry
fn inherited(explanation: PrivilegeExplanation) -> PrivilegeExplanation {
    if !explanation.is_granted() {
        return explanation;
    }
    PrivilegeExplanation {
        source: PrivilegeSource::Effective,
        superseded_privilege: None,
        override_source: None,
        details: "inherited from the global entry".to_string(),
        ..explanation
    }
}

fn render_explanations(
    role_name: &str,
    entries: &[EntryExplanation],
    json: bool,
) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(entries)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "role {}", role_name);
    for entry in entries {
        let _ = writeln!(out);
        if entry.inherited {
            let _ = writeln!(out, "[{}] {} (global entry)", entry.index, entry.spaces.join(", "));
        } else {
            let _ = writeln!(out, "[{}] {}", entry.index, entry.spaces.join(", "));
        }
        write_explanation(&mut out, "base", &entry.base);
        for (feature_id, explanation) in &entry.features {
            write_explanation(&mut out, feature_id, explanation);
        }
    }
    Ok(out.trim_end().to_string())
}

fn write_explanation(out: &mut String, label: &str, explanation: &PrivilegeExplanation) {
    let _ = writeln!(
        out,
        "  {:<16} {:<8} {:<30} {}",
        label, explanation.privilege, explanation.source, explanation.details
    );
}

// ============================================================================
// check
// ============================================================================

pub async fn check(
    actions: &[String],
    space: &str,
    authorization: Option<String>,
    json: bool,
) -> anyhow::Result<String> {
    let config = AuthzConfig::load()?;
    let transport = Arc::new(HttpPrivilegeCheckTransport::from_config(&config.check_privileges)?);
    let factory =
        CheckPrivilegesFactory::new(&config.application, Actions::new(&config.version), transport);

    let mut context = RequestContext::new(space);
    if let Some(authorization) = authorization {
        context = context.with_authorization(authorization);
    }

    let checker =
        CheckPrivilegesDynamically::new(factory.with_request(context), config.spaces_enabled);
    let response = checker.check(actions, &[]).await?;

    if json {
        return Ok(serde_json::to_string_pretty(&response)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "user {}", response.username);
    for (action, granted) in &response.privileges {
        let _ = writeln!(out, "  {} {}", if *granted { "✓" } else { "✗" }, action);
    }
    Ok(out.trim_end().to_string())
}

// ============================================================================
// audit
// ============================================================================

pub fn audit(
    limit: usize,
    failures: bool,
    user: Option<String>,
    stats: bool,
    json: bool,
) -> anyhow::Result<String> {
    let config = AuthzConfig::load()?;
    match AuditLogger::open(&config.audit)? {
        Some(logger) => render_audit(&logger, limit, failures, user, stats, json),
        None => Ok("audit logging is disabled".to_string()),
    }
}

fn render_audit(
    logger: &AuditLogger,
    limit: usize,
    failures: bool,
    user: Option<String>,
    stats: bool,
    json: bool,
) -> anyhow::Result<String> {
    if stats {
        let statistics = logger.statistics()?;
        if json {
            return Ok(serde_json::to_string_pretty(&statistics)?);
        }
        return Ok(format!(
            "entries: {}\nfailures: {}",
            statistics.total_entries, statistics.failures
        ));
    }

    let mut query = AuditQuery::new().with_limit(limit);
    if failures {
        query = query.with_events(vec![AuditEvent::AuthorizationFailure]);
    }
    if let Some(user) = user {
        query = query.with_username(user);
    }

    let entries = logger.query(&query)?;
    if json {
        return Ok(serde_json::to_string_pretty(&entries)?);
    }

    let mut out = String::new();
    for entry in &entries {
        let _ = writeln!(
            out,
            "{} {:<22} {:<12} {:<12} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.event.as_str(),
            entry.username,
            entry.action,
            entry.types.join(",")
        );
    }
    if entries.is_empty() {
        out.push_str("no audit entries");
    }
    Ok(out.trim_end().to_string())
}
