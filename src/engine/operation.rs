//! Serialized operations
//!
//! One JSON object describes one engine call, tagged by `op`:
//!
//! ```json
//! {"op": "update", "object_type": "user", "filter": {"_id": "u1"},
//!  "submission": {"application": {"essay": "..."}}, "submit": true}
//! ```
//!
//! Used by the CLI `exec` command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use super::query::{ReadQuery, UpdateOptions};
use super::Engine;
use crate::schema::Requester;
use crate::store::{Filter, SortSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Read(ReadOp),
    FetchOne(FetchOneOp),
    Create(CreateOp),
    Update(UpdateOp),
    Delete(DeleteOp),
}

impl Operation {
    pub fn object_type(&self) -> &str {
        match self {
            Self::Read(op) => &op.object_type,
            Self::FetchOne(op) => &op.object_type,
            Self::Create(op) => &op.object_type,
            Self::Update(op) => &op.object_type,
            Self::Delete(op) => &op.object_type,
        }
    }

    /// Operation name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::FetchOne(_) => "fetch_one",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }

    /// Run against `engine`; the result is the JSON payload of the response
    pub async fn execute(self, engine: &Engine, requester: &Requester) -> EngineResult<Value> {
        match self {
            Self::Read(op) => {
                let query = ReadQuery {
                    filter: op.filter.as_ref().map(parse_filter).transpose()?,
                    sort: op.sort,
                    page: op.page,
                    size: op.size,
                };
                let documents = engine.read(requester, &op.object_type, query).await?;
                Ok(Value::Array(documents))
            }
            Self::FetchOne(op) => {
                let filter = parse_filter(&op.filter)?;
                engine.fetch_one(requester, &op.object_type, filter).await
            }
            Self::Create(op) => {
                let id = engine.create(requester, &op.object_type, op.submission).await?;
                Ok(serde_json::json!({ "_id": id }))
            }
            Self::Update(op) => {
                let filter = parse_filter(&op.filter)?;
                let options = UpdateOptions { submit: op.submit };
                if op.returning {
                    let documents = engine
                        .update_returning(requester, &op.object_type, filter, op.submission, options)
                        .await?;
                    Ok(Value::Array(documents))
                } else {
                    let ids = engine
                        .update(requester, &op.object_type, filter, op.submission, options)
                        .await?;
                    Ok(serde_json::json!({ "updated": ids }))
                }
            }
            Self::Delete(op) => {
                let filter = parse_filter(&op.filter)?;
                let ids = engine.delete(requester, &op.object_type, filter).await?;
                Ok(serde_json::json!({ "deleted": ids }))
            }
        }
    }
}

/// Parse a Mongo-style JSON filter into a store filter
pub fn parse_filter(value: &Value) -> EngineResult<Filter> {
    Filter::from_json(value).map_err(|e| EngineError::BadRequest(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadOp {
    pub object_type: String,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOneOp {
    pub object_type: String,
    pub filter: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOp {
    pub object_type: String,
    pub submission: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOp {
    pub object_type: String,
    pub filter: Value,
    pub submission: Value,
    #[serde(default)]
    pub submit: bool,
    /// Return patched projections instead of ids
    #[serde(default)]
    pub returning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOp {
    pub object_type: String,
    pub filter: Value,
}
