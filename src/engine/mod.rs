//! # Field-level access engine
//!
//! Every read, create, update and delete against the document store passes
//! through [`Engine`]. Each call:
//!
//! 1. Resolves the schema tree of the object type
//! 2. Takes one universe snapshot
//! 3. Walks the tree against the stored documents and/or the submission
//! 4. Touches the store at most once for writes, only after every check passed
//!
//! The traversal is synchronous; the engine suspends only on the store and
//! the universe provider.

mod errors;
mod operation;
mod projection;
mod query;
mod validate;

pub use errors::{EngineError, EngineResult, Violation};
pub use operation::{parse_filter, CreateOp, DeleteOp, FetchOneOp, Operation, ReadOp, UpdateOp};
pub use projection::project;
pub use query::{ReadQuery, UpdateOptions};
pub use validate::{validate, validate_fields, Validation};

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::observability::{DenialKind, EngineMetrics};
use crate::patch::{apply_patch, DotPatch};
use crate::schema::{evaluate, CheckContext, ObjectSchema, Requester, SchemaRegistry};
use crate::store::{DocumentStore, EntityId, Filter, FindOptions};
use crate::universe::{UniverseState, UniverseStateProvider};

/// Authorization-aware façade over a document store
pub struct Engine {
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn DocumentStore>,
    universe: Arc<dyn UniverseStateProvider>,
    metrics: Arc<EngineMetrics>,
    config: EngineConfig,
}

/// Validated update, ready to persist
struct PreparedUpdate {
    documents: Vec<Value>,
    ids: Vec<EntityId>,
    patch: DotPatch,
    universe: UniverseState,
    schema: Arc<ObjectSchema>,
}

impl Engine {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn DocumentStore>,
        universe: Arc<dyn UniverseStateProvider>,
    ) -> Self {
        Self {
            registry,
            store,
            universe,
            metrics: Arc::new(EngineMetrics::new()),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a metrics registry with other components
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Message for `error` that is safe to show to `requester`
    pub fn public_message(&self, error: &EngineError, requester: &Requester) -> String {
        error.public_message(requester, &self.config.generic_denial_message)
    }

    /// Projected documents matching `query.filter`, one page at a time
    pub async fn read(&self, requester: &Requester, object_type: &str, query: ReadQuery) -> EngineResult<Vec<Value>> {
        let result = self.read_inner(requester, object_type, query).await;
        self.track("read", object_type, requester, result)
    }

    /// The single document matching `filter`, projected.
    ///
    /// A match whose projection is empty counts as not found.
    pub async fn fetch_one(&self, requester: &Requester, object_type: &str, filter: Filter) -> EngineResult<Value> {
        let result = self.fetch_one_inner(requester, object_type, filter).await;
        self.track("fetch_one", object_type, requester, result)
    }

    /// Validate and insert a new document; returns its id
    pub async fn create(&self, requester: &Requester, object_type: &str, submission: Value) -> EngineResult<EntityId> {
        let result = self.create_inner(requester, object_type, submission).await;
        self.track("create", object_type, requester, result)
    }

    /// Validate `submission` against every document matching `filter`, then
    /// patch all of them or none. Returns the ids of patched documents.
    pub async fn update(
        &self,
        requester: &Requester,
        object_type: &str,
        filter: Filter,
        submission: Value,
        options: UpdateOptions,
    ) -> EngineResult<Vec<EntityId>> {
        let result = async {
            let prepared = self
                .prepare_update(requester, object_type, &filter, &submission, options)
                .await?;
            self.persist_update(object_type, &prepared).await
        }
        .await;
        self.track("update", object_type, requester, result)
    }

    /// Like [`Self::update`], returning the patched documents as the
    /// requester would read them
    pub async fn update_returning(
        &self,
        requester: &Requester,
        object_type: &str,
        filter: Filter,
        submission: Value,
        options: UpdateOptions,
    ) -> EngineResult<Vec<Value>> {
        let result = async {
            let prepared = self
                .prepare_update(requester, object_type, &filter, &submission, options)
                .await?;
            let updated = self.persist_update(object_type, &prepared).await?;

            let mut views = Vec::with_capacity(updated.len());
            for mut document in prepared.documents {
                if !EntityId::of(&document).is_some_and(|id| updated.contains(&id)) {
                    continue;
                }
                apply_patch(&mut document, &prepared.patch);
                let ctx = CheckContext::for_target(requester, Some(&document), &prepared.universe);
                views.push(project(&prepared.schema, &document, &ctx)?);
            }
            Ok(views)
        }
        .await;
        self.track("update_returning", object_type, requester, result)
    }

    /// Remove every document matching `filter` if the root `delete` check
    /// passes; returns the removed ids
    pub async fn delete(&self, requester: &Requester, object_type: &str, filter: Filter) -> EngineResult<Vec<EntityId>> {
        let result = self.delete_inner(requester, object_type, filter).await;
        self.track("delete", object_type, requester, result)
    }

    fn schema(&self, object_type: &str) -> EngineResult<Arc<ObjectSchema>> {
        self.registry
            .get(object_type)
            .ok_or_else(|| EngineError::InvalidObjectType(object_type.to_string()))
    }

    async fn read_inner(&self, requester: &Requester, object_type: &str, query: ReadQuery) -> EngineResult<Vec<Value>> {
        let schema = self.schema(object_type)?;
        let filter = query
            .filter
            .ok_or_else(|| EngineError::BadRequest("a filter is required".into()))?;
        if query.size == Some(0) {
            return Err(EngineError::BadRequest("page size must be > 0".into()));
        }

        let size = self.config.page_size(query.size);
        let options = FindOptions {
            sort: query.sort,
            skip: query.page.unwrap_or(0).saturating_mul(size),
            limit: Some(size),
        };

        let universe = self.universe.current().await?;
        let documents = self.store.find(object_type, &filter, &options).await?;

        let projected = documents
            .iter()
            .map(|document| {
                let ctx = CheckContext::for_target(requester, Some(document), &universe);
                project(&schema, document, &ctx)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        self.metrics.record_read(projected.len() as u64);
        debug!(object_type, count = projected.len(), "read projected");
        Ok(projected)
    }

    async fn fetch_one_inner(&self, requester: &Requester, object_type: &str, filter: Filter) -> EngineResult<Value> {
        let schema = self.schema(object_type)?;
        let not_found = || EngineError::NotFound {
            object_type: object_type.to_string(),
        };

        let universe = self.universe.current().await?;
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        let documents = self.store.find(object_type, &filter, &options).await?;
        let document = documents.first().ok_or_else(not_found)?;

        let ctx = CheckContext::for_target(requester, Some(document), &universe);
        let projected = project(&schema, document, &ctx)?;
        if projected.as_object().map_or(true, Map::is_empty) {
            return Err(not_found());
        }

        self.metrics.record_read(1);
        Ok(projected)
    }

    async fn create_inner(&self, requester: &Requester, object_type: &str, submission: Value) -> EngineResult<EntityId> {
        let schema = self.schema(object_type)?;
        let universe = self.universe.current().await?;

        let patch = {
            let ctx = CheckContext::for_write(requester, None, &submission, &universe);
            let allowed = evaluate(schema.root().checks.create.as_ref(), &ctx)
                .map_err(|e| EngineError::check(object_type, e))?;
            if !allowed {
                return Err(EngineError::CreateDenied {
                    object_type: object_type.to_string(),
                });
            }

            let validation = validate_fields(&schema, &submission, &ctx, false)?;
            if !validation.is_ok() {
                return Err(EngineError::WriteDenied {
                    object_type: object_type.to_string(),
                    violations: validation.violations,
                });
            }
            validation.patch
        };

        let mut document = Value::Object(Map::new());
        apply_patch(&mut document, &patch);
        let id = self.store.insert(object_type, document).await?;

        self.metrics.record_create();
        info!(object_type, id = %id, fields = patch.len(), "document created");
        Ok(id)
    }

    async fn prepare_update(
        &self,
        requester: &Requester,
        object_type: &str,
        filter: &Filter,
        submission: &Value,
        options: UpdateOptions,
    ) -> EngineResult<PreparedUpdate> {
        let schema = self.schema(object_type)?;
        let universe = self.universe.current().await?;
        let documents = self
            .store
            .find(object_type, filter, &FindOptions::default())
            .await?;

        let mut patch = DotPatch::new();
        for document in &documents {
            let ctx = CheckContext::for_write(requester, Some(document), submission, &universe);
            let validation = validate(&schema, submission, &ctx, options.submit)?;
            if !validation.is_ok() {
                let object_type = object_type.to_string();
                let violations = validation.violations;
                return Err(if options.submit {
                    EngineError::SubmissionDenied {
                        object_type,
                        violations,
                    }
                } else {
                    EngineError::WriteDenied {
                        object_type,
                        violations,
                    }
                });
            }
            patch = validation.patch;
        }

        let ids = documents.iter().filter_map(EntityId::of).collect();
        Ok(PreparedUpdate {
            documents,
            ids,
            patch,
            universe,
            schema,
        })
    }

    async fn persist_update(&self, object_type: &str, prepared: &PreparedUpdate) -> EngineResult<Vec<EntityId>> {
        if prepared.ids.is_empty() {
            debug!(object_type, "update matched no documents");
            return Ok(Vec::new());
        }

        // Documents deleted since validation are skipped, not recreated.
        let updated = if prepared.patch.is_empty() {
            prepared.ids.clone()
        } else {
            self.store
                .update_many(object_type, &Filter::id_in(&prepared.ids), &prepared.patch)
                .await?
        };

        self.metrics.record_update(updated.len() as u64);
        info!(
            object_type,
            documents = updated.len(),
            fields = prepared.patch.len(),
            "documents updated"
        );
        Ok(updated)
    }

    async fn delete_inner(&self, requester: &Requester, object_type: &str, filter: Filter) -> EngineResult<Vec<EntityId>> {
        let schema = self.schema(object_type)?;
        let universe = self.universe.current().await?;

        let ctx = CheckContext::for_target(requester, None, &universe);
        let allowed = evaluate(schema.root().checks.delete.as_ref(), &ctx)
            .map_err(|e| EngineError::check(object_type, e))?;
        if !allowed {
            return Err(EngineError::DeleteDenied {
                object_type: object_type.to_string(),
            });
        }

        let removed = self.store.delete_many(object_type, &filter).await?;
        self.metrics.record_delete(removed.len() as u64);
        info!(object_type, documents = removed.len(), "documents deleted");
        Ok(removed)
    }

    /// Count and log refusals and internal failures
    fn track<T>(
        &self,
        operation: &'static str,
        object_type: &str,
        requester: &Requester,
        result: EngineResult<T>,
    ) -> EngineResult<T> {
        if let Err(err) = &result {
            let requester_id = requester.id.as_deref().unwrap_or("-");
            if err.is_internal() {
                self.metrics.record_internal_error();
                error!(operation, object_type, requester = requester_id, code = err.code(), error = %err, "engine failure");
            } else if let Some(kind) = denial_kind(err) {
                self.metrics.record_denial(kind);
                let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
                warn!(operation, object_type, requester = requester_id, code = err.code(), ?paths, "request refused");
            } else {
                debug!(operation, object_type, code = err.code(), "request rejected");
            }
        }
        result
    }
}

fn denial_kind(err: &EngineError) -> Option<DenialKind> {
    match err {
        EngineError::CreateDenied { .. } => Some(DenialKind::Create),
        EngineError::WriteDenied { .. } => Some(DenialKind::Write),
        EngineError::SubmissionDenied { .. } => Some(DenialKind::Submission),
        EngineError::DeleteDenied { .. } => Some(DenialKind::Delete),
        _ => None,
    }
}
