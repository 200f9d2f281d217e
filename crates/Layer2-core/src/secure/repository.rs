//! Saved-object repository seam

use super::predicate::Predicate;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace of the default space
pub const DEFAULT_SPACE_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedObject {
    pub id: String,

    #[serde(rename = "type")]
    pub object_type: String,

    pub attributes: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Options every repository call carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryOptions {
    /// `None` is the default space
    pub namespace: Option<String>,

    /// Only objects matching this may be read or written
    pub predicate: Option<Predicate>,
}

impl RepositoryOptions {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            predicate: None,
        }
    }

    /// Space the call targets
    pub fn space_id(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_SPACE_ID)
    }

    /// Narrow with `predicate`, AND-ing with any predicate already present
    pub fn restricted(&self, predicate: Predicate) -> Self {
        let predicate = match &self.predicate {
            Some(existing) => Predicate::all(vec![existing.clone(), predicate]),
            None => predicate,
        };
        Self {
            namespace: self.namespace.clone(),
            predicate: Some(predicate),
        }
    }

    pub fn allows(&self, attributes: &Value) -> bool {
        self.predicate
            .as_ref()
            .map(|p| p.matches(attributes))
            .unwrap_or(true)
    }
}

/// Shallow merge of an update into stored attributes
pub fn merge_attributes(target: &mut Value, update: Value) {
    match update {
        Value::Object(update) if target.is_object() => {
            if let Some(fields) = target.as_object_mut() {
                fields.extend(update);
            }
        }
        update => *target = update,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkCreateObject {
    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default)]
    pub id: Option<String>,

    pub attributes: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkGetObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkUpdateObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    pub attributes: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    pub types: Vec<String>,

    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl FindOptions {
    pub fn new(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(|t| t.to_string()).collect(),
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResponse {
    pub saved_objects: Vec<SavedObject>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Data access for saved objects
///
/// Implementations must honour `options.predicate`: objects that do not
/// match are treated as absent.
#[async_trait]
pub trait SavedObjectsRepository: Send + Sync {
    async fn create(
        &self,
        object_type: &str,
        attributes: Value,
        id: Option<String>,
        options: &RepositoryOptions,
    ) -> Result<SavedObject>;

    async fn bulk_create(
        &self,
        objects: Vec<BulkCreateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>>;

    async fn delete(&self, object_type: &str, id: &str, options: &RepositoryOptions) -> Result<()>;

    async fn find(&self, find: &FindOptions, options: &RepositoryOptions) -> Result<FindResponse>;

    /// Objects that do not exist are left out
    async fn bulk_get(
        &self,
        objects: &[BulkGetObject],
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>>;

    async fn get(
        &self,
        object_type: &str,
        id: &str,
        options: &RepositoryOptions,
    ) -> Result<SavedObject>;

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        attributes: Value,
        options: &RepositoryOptions,
    ) -> Result<SavedObject>;

    async fn bulk_update(
        &self,
        objects: Vec<BulkUpdateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>>;
}
