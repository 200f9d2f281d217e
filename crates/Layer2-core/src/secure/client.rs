//! Authorizing saved-objects client
//!
//! Wraps any [`SavedObjectsRepository`] and checks privileges before every
//! call. One privilege check per call; denied calls never reach the inner
//! repository.

use super::conditions::{ConditionalPrivilege, ConditionalPrivileges};
use super::predicate::Predicate;
use super::repository::{
    merge_attributes, BulkCreateObject, BulkGetObject, BulkUpdateObject, FindOptions,
    FindResponse, RepositoryOptions, SavedObject, SavedObjectsRepository,
};
use crate::check::{CheckPrivileges, CheckPrivilegesResponse};
use crate::error::{AuthzError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tessera_foundation::{Actions, AuditSink};
use tracing::{debug, warn};

/// Outcome of an allowed call
#[derive(Debug, Clone, PartialEq)]
enum Grant {
    Unconditional,
    Conditional(Predicate),
}

/// Privilege check result for one call, not yet audited
struct Decision {
    operation: Operation,
    types: Vec<String>,
    username: String,
    missing_actions: Vec<String>,
    denied: Vec<String>,
    conditions: Vec<Predicate>,
}

impl Decision {
    fn is_conditional(&self) -> bool {
        !self.missing_actions.is_empty() && !self.conditions.is_empty()
    }
}

/// Saved-object operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    BulkCreate,
    Delete,
    Find,
    BulkGet,
    Get,
    Update,
    BulkUpdate,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::BulkCreate => "bulk_create",
            Operation::Delete => "delete",
            Operation::Find => "find",
            Operation::BulkGet => "bulk_get",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::BulkUpdate => "bulk_update",
        }
    }

    fn is_bulk(&self) -> bool {
        matches!(
            self,
            Operation::BulkCreate | Operation::BulkGet | Operation::BulkUpdate
        )
    }
}

/// [`SavedObjectsRepository`] decorator enforcing privileges
pub struct SecureSavedObjectsClient {
    inner: Arc<dyn SavedObjectsRepository>,
    checker: CheckPrivileges,
    actions: Actions,
    audit: Arc<dyn AuditSink>,
    conditions: Arc<ConditionalPrivileges>,
    spaces_enabled: bool,
}

impl SecureSavedObjectsClient {
    pub fn new(
        inner: Arc<dyn SavedObjectsRepository>,
        checker: CheckPrivileges,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let actions = checker.actions().clone();
        Self {
            inner,
            checker,
            actions,
            audit,
            conditions: Arc::new(ConditionalPrivileges::new()),
            spaces_enabled: true,
        }
    }

    pub fn with_conditions(mut self, conditions: Arc<ConditionalPrivileges>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_spaces_enabled(mut self, enabled: bool) -> Self {
        self.spaces_enabled = enabled;
        self
    }

    async fn check(
        &self,
        privileges: &[String],
        options: &RepositoryOptions,
    ) -> Result<CheckPrivilegesResponse> {
        if self.spaces_enabled {
            self.checker
                .at_space(options.space_id(), privileges, &[])
                .await
        } else {
            self.checker.globally(privileges, &[]).await
        }
    }

    /// Run the privilege check for `operation` on `types`
    async fn decide(
        &self,
        operation: Operation,
        types: &[&str],
        options: &RepositoryOptions,
    ) -> Result<Decision> {
        let op = operation.as_str();

        let mut seen = HashSet::new();
        let types: Vec<String> = types
            .iter()
            .filter(|t| seen.insert(**t))
            .map(|t| t.to_string())
            .collect();

        let required: Vec<(String, String)> = types
            .iter()
            .map(|t| (t.clone(), self.actions.saved_object(t, op).into_string()))
            .collect();

        let conditional: Vec<(String, &ConditionalPrivilege)> = match types.as_slice() {
            [only] if !operation.is_bulk() => self
                .conditions
                .for_type(only)
                .iter()
                .map(|c| {
                    let action = self
                        .actions
                        .saved_object_conditional(only, op, &c.name)
                        .into_string();
                    (action, c)
                })
                .collect(),
            _ => Vec::new(),
        };

        let privileges: Vec<String> = required
            .iter()
            .map(|(_, action)| action.clone())
            .chain(conditional.iter().map(|(action, _)| action.clone()))
            .collect();

        let response = self.check(&privileges, options).await?;

        let missing: Vec<&(String, String)> = required
            .iter()
            .filter(|(_, action)| !response.is_granted(action))
            .collect();

        let conditions: Vec<Predicate> = conditional
            .iter()
            .filter(|(action, _)| response.is_granted(action))
            .map(|(_, c)| c.predicate(&response.username))
            .collect();

        let mut denied: Vec<String> = missing.iter().map(|(t, _)| t.clone()).collect();
        denied.sort();

        Ok(Decision {
            operation,
            missing_actions: missing.iter().map(|(_, a)| a.clone()).collect(),
            denied,
            conditions,
            types,
            username: response.username,
        })
    }

    /// Audit `decision` and turn it into a grant or a Forbidden error
    ///
    /// `proposed` is the object as it would be stored after the call, which
    /// must itself satisfy any conditional grant.
    fn settle(
        &self,
        decision: Decision,
        proposed: Option<&Value>,
        context: Value,
    ) -> Result<Grant> {
        let Decision {
            operation,
            types,
            username,
            missing_actions,
            denied,
            conditions,
        } = decision;
        let op = operation.as_str();
        let username = username.as_str();

        if missing_actions.is_empty() {
            debug!(username, operation = op, types = ?types, "Authorized");
            self.audit
                .authorization_success(username, op, &types, &context);
            return Ok(Grant::Unconditional);
        }

        if !conditions.is_empty() {
            let predicate = Predicate::any(conditions);
            if proposed.map_or(true, |attrs| predicate.matches(attrs)) {
                debug!(username, operation = op, types = ?types, "Authorized with conditions");
                self.audit
                    .authorization_success(username, op, &types, &context);
                return Ok(Grant::Conditional(predicate));
            }
        }

        warn!(
            username,
            operation = op,
            missing = ?missing_actions,
            "Authorization denied"
        );
        self.audit
            .authorization_failure(username, op, &types, &missing_actions, &context);

        Err(AuthzError::forbidden(
            format!("Unable to {} {}", op, denied.join(",")),
            missing_actions,
        ))
    }

    async fn authorize(
        &self,
        operation: Operation,
        types: &[&str],
        options: &RepositoryOptions,
        proposed: Option<&Value>,
        context: Value,
    ) -> Result<Grant> {
        let decision = self.decide(operation, types, options).await?;
        self.settle(decision, proposed, context)
    }

    fn scoped(options: &RepositoryOptions, grant: Grant) -> RepositoryOptions {
        match grant {
            Grant::Unconditional => options.clone(),
            Grant::Conditional(predicate) => options.restricted(predicate),
        }
    }
}

#[async_trait]
impl SavedObjectsRepository for SecureSavedObjectsClient {
    async fn create(
        &self,
        object_type: &str,
        attributes: Value,
        id: Option<String>,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        let context = json!({ "type": object_type, "id": id, "attributes": attributes });
        let grant = self
            .authorize(Operation::Create, &[object_type], options, Some(&attributes), context)
            .await?;
        self.inner
            .create(object_type, attributes, id, &Self::scoped(options, grant))
            .await
    }

    async fn bulk_create(
        &self,
        objects: Vec<BulkCreateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        let types: Vec<&str> = objects.iter().map(|o| o.object_type.as_str()).collect();
        let context = json!({ "objects": objects });
        self.authorize(Operation::BulkCreate, &types, options, None, context)
            .await?;
        self.inner.bulk_create(objects, options).await
    }

    async fn delete(&self, object_type: &str, id: &str, options: &RepositoryOptions) -> Result<()> {
        let context = json!({ "type": object_type, "id": id });
        let grant = self
            .authorize(Operation::Delete, &[object_type], options, None, context)
            .await?;
        self.inner
            .delete(object_type, id, &Self::scoped(options, grant))
            .await
    }

    async fn find(&self, find: &FindOptions, options: &RepositoryOptions) -> Result<FindResponse> {
        let types: Vec<&str> = find.types.iter().map(String::as_str).collect();
        let context = json!({ "options": find });
        let grant = self
            .authorize(Operation::Find, &types, options, None, context)
            .await?;
        self.inner.find(find, &Self::scoped(options, grant)).await
    }

    async fn bulk_get(
        &self,
        objects: &[BulkGetObject],
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        let types: Vec<&str> = objects.iter().map(|o| o.object_type.as_str()).collect();
        let context = json!({ "objects": objects });
        self.authorize(Operation::BulkGet, &types, options, None, context)
            .await?;
        self.inner.bulk_get(objects, options).await
    }

    async fn get(
        &self,
        object_type: &str,
        id: &str,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        let context = json!({ "type": object_type, "id": id });
        let grant = self
            .authorize(Operation::Get, &[object_type], options, None, context)
            .await?;
        self.inner
            .get(object_type, id, &Self::scoped(options, grant))
            .await
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        attributes: Value,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        let context = json!({ "type": object_type, "id": id, "attributes": attributes });
        let decision = self.decide(Operation::Update, &[object_type], options).await?;

        // a conditional grant must still cover the object once updated
        let proposed = if decision.is_conditional() {
            let scope = options.restricted(Predicate::any(decision.conditions.clone()));
            match self.inner.get(object_type, id, &scope).await {
                Ok(current) => {
                    let mut merged = current.attributes;
                    merge_attributes(&mut merged, attributes.clone());
                    Some(merged)
                }
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        let grant = self.settle(decision, proposed.as_ref(), context)?;
        self.inner
            .update(object_type, id, attributes, &Self::scoped(options, grant))
            .await
    }

    async fn bulk_update(
        &self,
        objects: Vec<BulkUpdateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        let types: Vec<&str> = objects.iter().map(|o| o.object_type.as_str()).collect();
        let context = json!({ "objects": objects });
        self.authorize(Operation::BulkUpdate, &types, options, None, context)
            .await?;
        self.inner.bulk_update(objects, options).await
    }
}
