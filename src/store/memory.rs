//! In-memory document store
//!
//! Collections are vectors of JSON objects in insertion order, guarded by one
//! `RwLock`. Each many-document operation runs under a single write lock, so
//! a call is atomic with respect to every other call.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::{DocumentStore, EntityId, FindOptions, ID_FIELD};
use crate::patch::{apply_patch, DotPatch};

type Collections = HashMap<String, Vec<Value>>;

/// Reference [`DocumentStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load collections from a JSON file of shape `{collection: [documents]}`.
    ///
    /// A missing file yields an empty store.
    pub async fn load(path: &Path) -> StoreResult<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(Self::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let data: Collections = serde_json::from_str(&content)?;

        for (collection, documents) in &data {
            for document in documents {
                if EntityId::of(document).is_none() {
                    return Err(StoreError::InvalidDocument(format!(
                        "document without string _id in '{}'",
                        collection
                    )));
                }
            }
        }

        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Write every collection to a JSON file
    pub async fn save(&self, path: &Path) -> StoreResult<()> {
        let content = {
            let data = self.read_lock()?;
            serde_json::to_string_pretty(&*data)?
        };
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Copy of every document in a collection
    pub fn snapshot(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let data = self.read_lock()?;
        Ok(data.get(collection).cloned().unwrap_or_default())
    }

    /// Seed a document directly, bypassing id generation
    pub fn seed(&self, collection: &str, document: Value) -> StoreResult<()> {
        if EntityId::of(&document).is_none() {
            return Err(StoreError::InvalidDocument("seeded document needs a string _id".into()));
        }
        let mut data = self.write_lock()?;
        data.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Collections>> {
        self.data
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write_lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.data
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Value>> {
        let data = self.read_lock()?;

        let mut results: Vec<Value> = data
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            sort.sort(&mut results);
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(results.into_iter().skip(options.skip).take(limit).collect())
    }

    async fn insert(&self, collection: &str, mut document: Value) -> StoreResult<EntityId> {
        let obj = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument("document must be an object".into()))?;

        let existing = obj.get(ID_FIELD).cloned();
        let id = match existing {
            Some(Value::String(id)) => EntityId::new(id),
            Some(_) => return Err(StoreError::InvalidDocument("_id must be a string".into())),
            None => {
                let id = EntityId::generate();
                obj.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
                id
            }
        };

        let mut data = self.write_lock()?;
        let docs = data.entry(collection.to_string()).or_default();
        if docs.iter().any(|doc| EntityId::of(doc).as_ref() == Some(&id)) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        docs.push(document);
        Ok(id)
    }

    async fn update_many(&self, collection: &str, filter: &Filter, patch: &DotPatch) -> StoreResult<Vec<EntityId>> {
        if patch.paths().any(|path| path == ID_FIELD) {
            return Err(StoreError::InvalidDocument("_id is immutable".into()));
        }

        let mut data = self.write_lock()?;
        let mut updated = Vec::new();

        if let Some(docs) = data.get_mut(collection) {
            for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
                apply_patch(doc, patch);
                if let Some(id) = EntityId::of(doc) {
                    updated.push(id);
                }
            }
        }

        Ok(updated)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<EntityId>> {
        let mut data = self.write_lock()?;
        let mut removed = Vec::new();

        if let Some(docs) = data.get_mut(collection) {
            docs.retain(|doc| {
                if filter.matches(doc) {
                    removed.extend(EntityId::of(doc));
                    false
                } else {
                    true
                }
            });
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortSpec;
    use serde_json::json;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (id, n) in [("a", 3), ("b", 1), ("c", 2)] {
            store.seed("posts", json!({"_id": id, "n": n})).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = InMemoryStore::new();
        let id = store.insert("users", json!({"name": "Ada"})).await.unwrap();

        let docs = store.snapshot("users").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["_id"], json!(id.as_str()));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = seeded();
        let result = store.insert("posts", json!({"_id": "a"})).await;
        assert!(matches!(result, Err(StoreError::DuplicateId { .. })));
    }

    #[tokio::test]
    async fn test_insert_rejects_non_object() {
        let store = InMemoryStore::new();
        assert!(store.insert("posts", json!([1])).await.is_err());
    }

    #[tokio::test]
    async fn test_find_sort_and_paginate() {
        let store = seeded();
        let options = FindOptions {
            sort: Some(SortSpec::asc("n")),
            skip: 1,
            limit: Some(1),
        };

        let docs = store.find("posts", &Filter::all(), &options).await.unwrap();
        assert_eq!(docs, vec![json!({"_id": "c", "n": 2})]);
    }

    #[tokio::test]
    async fn test_find_unknown_collection_is_empty() {
        let store = InMemoryStore::new();
        let docs = store
            .find("missing", &Filter::all(), &FindOptions::default())
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_update_many_patches_matches_only() {
        let store = seeded();
        let patch = DotPatch::new().with("meta.seen", json!(true));

        let ids = store
            .update_many("posts", &Filter::id_in(&[EntityId::from("a"), EntityId::from("c")]), &patch)
            .await
            .unwrap();

        assert_eq!(ids, vec![EntityId::from("a"), EntityId::from("c")]);
        let docs = store.snapshot("posts").unwrap();
        assert_eq!(docs[0]["meta"]["seen"], json!(true));
        assert!(docs[1].get("meta").is_none());
    }

    #[tokio::test]
    async fn test_update_many_refuses_id_change() {
        let store = seeded();
        let patch = DotPatch::new().with("_id", json!("z"));
        assert!(store.update_many("posts", &Filter::all(), &patch).await.is_err());
        assert_eq!(store.snapshot("posts").unwrap()[0]["_id"], json!("a"));
    }

    #[tokio::test]
    async fn test_delete_many_returns_removed_ids() {
        let store = seeded();
        let filter = Filter::from_json(&json!({"n": {"$gte": 2}})).unwrap();

        let ids = store.delete_many("posts", &filter).await.unwrap();

        assert_eq!(ids, vec![EntityId::from("a"), EntityId::from("c")]);
        assert_eq!(store.snapshot("posts").unwrap(), vec![json!({"_id": "b", "n": 1})]);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = seeded();
        store.save(&path).await.unwrap();

        let loaded = InMemoryStore::load(&path).await.unwrap();
        assert_eq!(loaded.snapshot("posts").unwrap(), store.snapshot("posts").unwrap());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryStore::load(&dir.path().join("none.json")).await.unwrap();
        assert!(store.snapshot("users").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_documents_without_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"users": [{"name": "no id"}]}"#).unwrap();

        assert!(matches!(
            InMemoryStore::load(&path).await,
            Err(StoreError::InvalidDocument(_))
        ));
    }
}
