//! Reusable predicates and interceptors
//!
//! Building blocks for schema definitions. Leaf rules look at
//! `ctx.field_value`; identity rules look at `ctx.request_user` and the
//! target document.

use regex::Regex;
use serde_json::Value;

use super::predicate::{CheckFailure, Interceptor, Predicate};

pub fn allow() -> Predicate {
    Predicate::allow()
}

pub fn deny() -> Predicate {
    Predicate::deny()
}

/// Admins and organizers
pub fn privileged() -> Predicate {
    Predicate::when(|ctx| ctx.request_user.is_privileged())
}

pub fn admin_only() -> Predicate {
    Predicate::when(|ctx| ctx.request_user.is_admin())
}

/// Any authenticated caller
pub fn authenticated() -> Predicate {
    Predicate::when(|ctx| ctx.request_user.is_authenticated())
}

/// Requester's id matches the target's `_id`
pub fn is_owner() -> Predicate {
    Predicate::when(|ctx| ctx.requester_owns_target())
}

pub fn owner_or_privileged() -> Predicate {
    any_of(vec![is_owner(), privileged()])
}

/// String no longer than `max` characters. Null passes; other types fail.
pub fn max_length(max: usize) -> Predicate {
    Predicate::when(move |ctx| match ctx.field_value {
        Some(Value::String(s)) => s.chars().count() <= max,
        Some(Value::Null) | None => true,
        Some(_) => false,
    })
}

/// Present, non-null, and not an empty (or whitespace-only) string or array
pub fn non_empty() -> Predicate {
    Predicate::when(|ctx| match ctx.field_value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    })
}

/// Value equals one of `allowed`
pub fn one_of(allowed: Vec<Value>) -> Predicate {
    Predicate::when(move |ctx| ctx.field_value.is_some_and(|v| allowed.contains(v)))
}

/// Value is the boolean `true`
pub fn is_true() -> Predicate {
    Predicate::when(|ctx| ctx.field_value == Some(&Value::Bool(true)))
}

/// Value is a boolean
pub fn is_bool() -> Predicate {
    Predicate::when(|ctx| matches!(ctx.field_value, Some(Value::Bool(_))))
}

/// String matching `pattern`. Null passes.
///
/// An invalid pattern is a schema bug and surfaces as a check failure.
pub fn matches_pattern(pattern: &str) -> Predicate {
    let compiled = Regex::new(pattern).map_err(|e| CheckFailure::new(format!("invalid pattern: {}", e)));
    Predicate::try_when(move |ctx| {
        let regex = compiled.as_ref().map_err(Clone::clone)?;
        Ok(match ctx.field_value {
            Some(Value::String(s)) => regex.is_match(s),
            Some(Value::Null) | None => true,
            Some(_) => false,
        })
    })
}

/// Universe snapshot is still before the named deadline
pub fn before_deadline(name: &'static str) -> Predicate {
    Predicate::when(move |ctx| ctx.universe_state.before(name))
}

/// Dot path in the target document holds `true`
pub fn target_flag(path: &'static str) -> Predicate {
    Predicate::when(move |ctx| ctx.target_at(path) == Some(&Value::Bool(true)))
}

/// Dot path in the target document does not hold `true`
pub fn target_flag_unset(path: &'static str) -> Predicate {
    Predicate::when(move |ctx| ctx.target_at(path) != Some(&Value::Bool(true)))
}

/// All predicates pass; evaluation stops at the first false
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::try_when(move |ctx| {
        for predicate in &predicates {
            if !predicate.evaluate(ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

/// Any predicate passes; evaluation stops at the first true
pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::try_when(move |ctx| {
        for predicate in &predicates {
            if predicate.evaluate(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
}

/// Replace any present value with `sentinel`
pub fn redact(sentinel: &'static str) -> Interceptor {
    Interceptor::new(move |value, _| match value {
        Some(Value::Null) | None => Value::Null,
        Some(_) => Value::String(sentinel.to_string()),
    })
}
