//! # Filter expressions
//!
//! Conjunctive document filters used by the store to select documents.
//! Parsed from Mongo-style JSON:
//!
//! ```json
//! {"status.accepted": true, "age": {"$gte": 18}, "_id": {"$in": ["a", "b"]}}
//! ```

use std::cmp::Ordering;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::sorter::compare_json_values;
use super::{EntityId, ID_FIELD};
use crate::schema::lookup_path;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// SQL LIKE pattern (`%` any sequence, `_` one char)
    Like,
    /// Value in list
    In,
    /// Field present (`true`) or absent (`false`)
    Exists,
}

impl FilterOperator {
    /// Parse a `$op` key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Self::Eq),
            "$ne" => Some(Self::Neq),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$like" => Some(Self::Like),
            "$in" => Some(Self::In),
            "$exists" => Some(Self::Exists),
            _ => None,
        }
    }
}

/// `$like` pattern compiled to an anchored regex
#[derive(Debug, Clone)]
struct LikePattern(Regex);

impl LikePattern {
    /// `%` matches any sequence, `_` one char; everything else is literal
    fn compile(pattern: &str) -> StoreResult<Self> {
        let mut expr = String::with_capacity(pattern.len() + 2);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '%' => expr.push_str(".*"),
                '_' => expr.push('.'),
                c => expr.push_str(&regex::escape(&c.to_string())),
            }
        }
        expr.push('$');

        Regex::new(&expr)
            .map(Self)
            .map_err(|e| StoreError::InvalidFilter(format!("bad like pattern '{}': {}", pattern, e)))
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

/// A single comparison against a dot path
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    field: String,
    operator: FilterOperator,
    value: Value,
    like: Option<LikePattern>,
}

impl FilterExpr {
    /// Build an expression, compiling `$like` patterns up front
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> StoreResult<Self> {
        let field = field.into();
        let like = match operator {
            FilterOperator::Like => {
                let pattern = value.as_str().ok_or_else(|| {
                    StoreError::InvalidFilter(format!("'$like' on '{}' requires a string", field))
                })?;
                Some(LikePattern::compile(pattern)?)
            }
            FilterOperator::In if !value.is_array() => {
                return Err(StoreError::InvalidFilter(format!("'$in' on '{}' requires an array", field)));
            }
            _ => None,
        };
        Ok(Self {
            field,
            operator,
            value,
            like,
        })
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Eq,
            value,
            like: None,
        }
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::In,
            value: Value::Array(values),
            like: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Check if a document matches this expression
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match lookup_path(doc, &self.field) {
            Some(v) => v,
            None => {
                return match self.operator {
                    FilterOperator::Exists => self.value == Value::Bool(false),
                    FilterOperator::Neq => true,
                    _ => false,
                }
            }
        };

        match self.operator {
            FilterOperator::Eq => field_value == &self.value,
            FilterOperator::Neq => field_value != &self.value,
            FilterOperator::Gt => ordered(field_value, &self.value, |o| o == Ordering::Greater),
            FilterOperator::Gte => ordered(field_value, &self.value, |o| o != Ordering::Less),
            FilterOperator::Lt => ordered(field_value, &self.value, |o| o == Ordering::Less),
            FilterOperator::Lte => ordered(field_value, &self.value, |o| o != Ordering::Greater),
            FilterOperator::Like => match (field_value.as_str(), &self.like) {
                (Some(text), Some(LikePattern(re))) => re.is_match(text),
                _ => false,
            },
            FilterOperator::In => self
                .value
                .as_array()
                .is_some_and(|values| values.contains(field_value)),
            FilterOperator::Exists => self.value == Value::Bool(true),
        }
    }
}

fn ordered(a: &Value, b: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    compare_json_values(a, b).is_some_and(accept)
}

/// Expressions combined with AND logic; empty matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    exprs: Vec<FilterExpr>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching documents whose `_id` is in `ids`
    pub fn id_in(ids: &[EntityId]) -> Self {
        Self::all().and(FilterExpr::in_list(
            ID_FIELD,
            ids.iter().map(|id| Value::String(id.as_str().to_string())).collect(),
        ))
    }

    /// Filter matching one `_id`
    pub fn by_id(id: &EntityId) -> Self {
        Self::all().and(FilterExpr::eq(ID_FIELD, Value::String(id.as_str().to_string())))
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::all().and(FilterExpr::eq(field, value))
    }

    pub fn and(mut self, expr: FilterExpr) -> Self {
        self.exprs.push(expr);
        self
    }

    pub fn exprs(&self) -> &[FilterExpr] {
        &self.exprs
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Check if a document matches all expressions
    pub fn matches(&self, doc: &Value) -> bool {
        self.exprs.iter().all(|expr| expr.matches(doc))
    }

    /// Parse a Mongo-style filter object.
    ///
    /// A plain value means equality; an object whose keys all start with `$`
    /// is a set of operator expressions on that field.
    pub fn from_json(value: &Value) -> StoreResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter("filter must be an object".into()))?;

        let mut filter = Self::all();
        for (field, condition) in obj {
            match condition {
                Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                    for (key, operand) in ops {
                        let operator = FilterOperator::from_key(key).ok_or_else(|| {
                            StoreError::InvalidFilter(format!("unknown operator '{}' on '{}'", key, field))
                        })?;
                        filter = filter.and(FilterExpr::new(field.clone(), operator, operand.clone())?);
                    }
                }
                other => filter = filter.and(FilterExpr::eq(field.clone(), other.clone())),
            }
        }
        Ok(filter)
    }
}
