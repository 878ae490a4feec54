//! # Document store collaborator
//!
//! The engine does not own storage. It talks to any backend implementing
//! [`DocumentStore`]: filtered find, insert, update-many by filter with a
//! dot-path patch, and delete-many by filter. Every document carries a string
//! `_id`.
//!
//! [`InMemoryStore`] is the reference backend used by the CLI and tests.

mod errors;
mod filter;
mod memory;
mod sorter;

pub use errors::{StoreError, StoreResult};
pub use filter::{Filter, FilterExpr, FilterOperator};
pub use memory::InMemoryStore;
pub use sorter::{compare_json_values, SortDirection, SortSpec};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::DotPatch;

/// Name of the identifier field on every stored document
pub const ID_FIELD: &str = "_id";

/// Stable document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the `_id` of a document
    pub fn of(document: &Value) -> Option<Self> {
        document.get(ID_FIELD)?.as_str().map(Self::new)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordering and pagination for [`DocumentStore::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
}

/// Backing document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, sorted then paginated
    async fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Value>>;

    /// Insert a document, assigning an `_id` when absent
    async fn insert(&self, collection: &str, document: Value) -> StoreResult<EntityId>;

    /// Apply `patch` to every document matching `filter` in one atomic step
    async fn update_many(&self, collection: &str, filter: &Filter, patch: &DotPatch) -> StoreResult<Vec<EntityId>>;

    /// Remove every document matching `filter` in one atomic step
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<EntityId>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_of_document() {
        assert_eq!(EntityId::of(&json!({"_id": "u1"})), Some(EntityId::from("u1")));
        assert_eq!(EntityId::of(&json!({"_id": 7})), None);
        assert_eq!(EntityId::of(&json!({})), None);
    }

    #[test]
    fn test_entity_id_serializes_as_string() {
        let id = EntityId::from("u1");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("u1"));
        assert_eq!(id.to_string(), "u1");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }
}
