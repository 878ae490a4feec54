//! Predicates and interceptors
//!
//! A check slot on a schema node is `Option<Predicate>`. The evaluator is the
//! single place where "constant vs callable vs absent" is decided:
//!
//! - `None` denies
//! - `Const(b)` yields `b`
//! - `Fn(f)` yields `f(ctx)`; a failure is returned, never coerced to deny

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::context::CheckContext;

/// A predicate or interceptor failed to produce an answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CheckFailure {
    pub message: String,
}

impl CheckFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Callable predicate body
pub type CheckFn = dyn Fn(&CheckContext<'_>) -> Result<bool, CheckFailure> + Send + Sync;

/// Read-time value transform: `(stored value, context) -> exposed value`
pub type InterceptFn =
    dyn Fn(Option<&Value>, &CheckContext<'_>) -> Result<Value, CheckFailure> + Send + Sync;

/// Authorization predicate: a constant or a function of the check context
#[derive(Clone)]
pub enum Predicate {
    Const(bool),
    Fn(Arc<CheckFn>),
}

impl Predicate {
    pub fn allow() -> Self {
        Self::Const(true)
    }

    pub fn deny() -> Self {
        Self::Const(false)
    }

    /// Infallible predicate
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&CheckContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::try_when(move |ctx| Ok(f(ctx)))
    }

    /// Predicate that may fail; failures surface as internal errors
    pub fn try_when<F>(f: F) -> Self
    where
        F: Fn(&CheckContext<'_>) -> Result<bool, CheckFailure> + Send + Sync + 'static,
    {
        Self::Fn(Arc::new(f))
    }

    pub fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<bool, CheckFailure> {
        match self {
            Self::Const(value) => Ok(*value),
            Self::Fn(f) => f(ctx),
        }
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Self::Const(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "Const({})", value),
            Self::Fn(_) => write!(f, "Fn(..)"),
        }
    }
}

/// Evaluate an optional check slot; an empty slot denies
pub fn evaluate(slot: Option<&Predicate>, ctx: &CheckContext<'_>) -> Result<bool, CheckFailure> {
    match slot {
        Some(predicate) => predicate.evaluate(ctx),
        None => Ok(false),
    }
}

/// Read-time value transform attached to a leaf
#[derive(Clone)]
pub struct Interceptor(Arc<InterceptFn>);

impl Interceptor {
    /// Interceptor that may fail
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &CheckContext<'_>) -> Result<Value, CheckFailure> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Infallible interceptor
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &CheckContext<'_>) -> Value + Send + Sync + 'static,
    {
        Self::try_new(move |value, ctx| Ok(f(value, ctx)))
    }

    pub fn apply(&self, value: Option<&Value>, ctx: &CheckContext<'_>) -> Result<Value, CheckFailure> {
        (self.0)(value, ctx)
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interceptor(..)")
    }
}
