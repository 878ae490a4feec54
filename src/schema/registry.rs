//! Schema registry
//!
//! Maps object-type names to their schema trees. Populated once at startup,
//! then shared read-only (`Arc<SchemaRegistry>`) by every in-flight call.

use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::types::{GroupSpec, ObjectSchema};

/// In-memory registry of object schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<ObjectSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object schema.
    ///
    /// A registered type is immutable; registering the same name again fails.
    pub fn register(&mut self, schema: ObjectSchema) -> SchemaResult<()> {
        if self.schemas.contains_key(schema.object_type()) {
            return Err(SchemaError::AlreadyRegistered(schema.object_type().to_string()));
        }
        self.schemas
            .insert(schema.object_type().to_string(), Arc::new(schema));
        Ok(())
    }

    /// Builds and registers a schema from its root group
    pub fn define(&mut self, object_type: impl Into<String>, root: GroupSpec) -> SchemaResult<()> {
        self.register(ObjectSchema::new(object_type, root)?)
    }

    /// Builder-style variant of [`Self::define`]
    pub fn with(mut self, object_type: impl Into<String>, root: GroupSpec) -> SchemaResult<Self> {
        self.define(object_type, root)?;
        Ok(self)
    }

    pub fn get(&self, object_type: &str) -> Option<Arc<ObjectSchema>> {
        self.schemas.get(object_type).cloned()
    }

    pub fn contains(&self, object_type: &str) -> bool {
        self.schemas.contains_key(object_type)
    }

    /// Registered type names, sorted for deterministic output
    pub fn object_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
