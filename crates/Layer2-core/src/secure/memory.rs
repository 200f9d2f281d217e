//! In-memory saved-object repository

use super::repository::{
    merge_attributes, BulkCreateObject, BulkGetObject, BulkUpdateObject, FindOptions,
    FindResponse, RepositoryOptions, SavedObject, SavedObjectsRepository,
};
use crate::error::{AuthzError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// (namespace, type, id)
type Key = (Option<String>, String, String);

/// Repository kept in a map, partitioned by namespace
#[derive(Default)]
pub struct InMemorySavedObjectsRepository {
    objects: RwLock<BTreeMap<Key, SavedObject>>,
}

impl InMemorySavedObjectsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn key(options: &RepositoryOptions, object_type: &str, id: &str) -> Key {
        (options.namespace.clone(), object_type.to_string(), id.to_string())
    }

    fn insert(
        &self,
        object_type: &str,
        attributes: Value,
        id: Option<String>,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let key = Self::key(options, object_type, &id);

        let mut objects = self.objects.write();
        if objects.contains_key(&key) {
            return Err(AuthzError::conflict(object_type, id));
        }

        let object = SavedObject {
            id,
            object_type: object_type.to_string(),
            attributes,
            namespace: options.namespace.clone(),
        };
        objects.insert(key, object.clone());
        Ok(object)
    }

    fn visible(
        &self,
        object_type: &str,
        id: &str,
        options: &RepositoryOptions,
    ) -> Option<SavedObject> {
        self.objects
            .read()
            .get(&Self::key(options, object_type, id))
            .filter(|o| options.allows(&o.attributes))
            .cloned()
    }

    fn replace(
        &self,
        object_type: &str,
        id: &str,
        attributes: Value,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&Self::key(options, object_type, id))
            .filter(|o| options.allows(&o.attributes))
            .ok_or_else(|| AuthzError::not_found(object_type, id))?;

        merge_attributes(&mut object.attributes, attributes);
        Ok(object.clone())
    }
}

#[async_trait]
impl SavedObjectsRepository for InMemorySavedObjectsRepository {
    async fn create(
        &self,
        object_type: &str,
        attributes: Value,
        id: Option<String>,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        self.insert(object_type, attributes, id, options)
    }

    async fn bulk_create(
        &self,
        objects: Vec<BulkCreateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        objects
            .into_iter()
            .map(|o| self.insert(&o.object_type, o.attributes, o.id, options))
            .collect()
    }

    async fn delete(&self, object_type: &str, id: &str, options: &RepositoryOptions) -> Result<()> {
        if self.visible(object_type, id, options).is_none() {
            return Err(AuthzError::not_found(object_type, id));
        }
        self.objects.write().remove(&Self::key(options, object_type, id));
        Ok(())
    }

    async fn find(&self, find: &FindOptions, options: &RepositoryOptions) -> Result<FindResponse> {
        let matching: Vec<SavedObject> = self
            .objects
            .read()
            .values()
            .filter(|o| o.namespace == options.namespace)
            .filter(|o| find.types.contains(&o.object_type))
            .filter(|o| options.allows(&o.attributes))
            .cloned()
            .collect();

        let per_page = find.per_page.max(1);
        let skip = find.page.saturating_sub(1) * per_page;

        Ok(FindResponse {
            total: matching.len(),
            saved_objects: matching.into_iter().skip(skip).take(per_page).collect(),
            page: find.page,
            per_page,
        })
    }

    async fn bulk_get(
        &self,
        objects: &[BulkGetObject],
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        Ok(objects
            .iter()
            .filter_map(|o| self.visible(&o.object_type, &o.id, options))
            .collect())
    }

    async fn get(
        &self,
        object_type: &str,
        id: &str,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        self.visible(object_type, id, options)
            .ok_or_else(|| AuthzError::not_found(object_type, id))
    }

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        attributes: Value,
        options: &RepositoryOptions,
    ) -> Result<SavedObject> {
        self.replace(object_type, id, attributes, options)
    }

    async fn bulk_update(
        &self,
        objects: Vec<BulkUpdateObject>,
        options: &RepositoryOptions,
    ) -> Result<Vec<SavedObject>> {
        objects
            .into_iter()
            .map(|o| self.replace(&o.object_type, &o.id, o.attributes, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure::Predicate;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_get_conflict() {
        let repo = InMemorySavedObjectsRepository::new();
        let options = RepositoryOptions::default();

        let created = repo
            .create("doc", json!({ "title": "a" }), Some("1".into()), &options)
            .await
            .unwrap();
        assert_eq!(created.id, "1");

        let fetched = repo.get("doc", "1", &options).await.unwrap();
        assert_eq!(fetched.attributes["title"], "a");

        let err = repo
            .create("doc", json!({}), Some("1".into()), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let repo = InMemorySavedObjectsRepository::new();
        repo.create("doc", json!({}), Some("1".into()), &RepositoryOptions::in_namespace("a"))
            .await
            .unwrap();

        let err = repo.get("doc", "1", &RepositoryOptions::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_predicate_hides_objects() {
        let repo = InMemorySavedObjectsRepository::new();
        let options = RepositoryOptions::default();
        repo.create("doc", json!({ "ownerId": "u1" }), Some("1".into()), &options)
            .await
            .unwrap();
        repo.create("doc", json!({ "ownerId": "u2" }), Some("2".into()), &options)
            .await
            .unwrap();

        let restricted = options.restricted(Predicate::property_equals("ownerId", "u1"));
        assert!(repo.get("doc", "2", &restricted).await.unwrap_err().is_not_found());

        let found = repo.find(&FindOptions::new(&["doc"]), &restricted).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.saved_objects[0].id, "1");

        assert!(repo.delete("doc", "2", &restricted).await.is_err());
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_attributes() {
        let repo = InMemorySavedObjectsRepository::new();
        let options = RepositoryOptions::default();
        repo.create("doc", json!({ "a": 1, "b": 1 }), Some("1".into()), &options)
            .await
            .unwrap();

        let updated = repo.update("doc", "1", json!({ "b": 2 }), &options).await.unwrap();
        assert_eq!(updated.attributes, json!({ "a": 1, "b": 2 }));
    }
}
