//! Read projection
//!
//! Walks a schema tree in lock-step with a stored document and keeps only the
//! keys the requester may see, in declared order.
//!
//! - A group whose `read` gate fails contributes no child keys. When present
//!   in the document it is emitted as `{}`.
//! - A leaf whose `read` check fails is omitted.
//! - Interceptors run only after `read` passes.
//! - Failing predicates abort the projection; they never hide a field.

use serde_json::{Map, Value};
use tracing::trace;

use super::errors::{EngineError, EngineResult};
use crate::schema::{evaluate, make_path, CheckContext, GroupSpec, LeafSpec, Node, ObjectSchema};

/// Project one stored document for the requester in `ctx`.
///
/// `ctx.target_object` should be the same document.
pub fn project(schema: &ObjectSchema, document: &Value, ctx: &CheckContext<'_>) -> EngineResult<Value> {
    let root = schema.root();
    let gate = evaluate(root.checks.read.as_ref(), ctx)
        .map_err(|e| EngineError::check(schema.object_type(), e))?;

    if !gate {
        trace!(object_type = schema.object_type(), "root read gate closed");
        return Ok(Value::Object(Map::new()));
    }

    match document {
        Value::Object(fields) => Ok(Value::Object(project_group(root, fields, "", ctx)?)),
        _ => Ok(Value::Object(Map::new())),
    }
}

fn project_group(
    group: &GroupSpec,
    fields: &Map<String, Value>,
    prefix: &str,
    ctx: &CheckContext<'_>,
) -> EngineResult<Map<String, Value>> {
    let mut out = Map::new();

    for (name, node) in &group.fields {
        let path = make_path(prefix, name);
        let value = fields.get(name);

        match node {
            Node::Leaf(leaf) => {
                if let Some(projected) = project_leaf(leaf, value, &path, ctx)? {
                    out.insert(name.clone(), projected);
                }
            }
            Node::Group(child) => {
                let Some(Value::Object(child_fields)) = value else {
                    continue;
                };

                let gate = evaluate(child.checks.read.as_ref(), &ctx.at_field(None))
                    .map_err(|e| EngineError::check(&path, e))?;

                if gate {
                    out.insert(
                        name.clone(),
                        Value::Object(project_group(child, child_fields, &path, ctx)?),
                    );
                } else {
                    trace!(path = %path, "group read gate closed");
                    out.insert(name.clone(), Value::Object(Map::new()));
                }
            }
        }
    }

    Ok(out)
}

fn project_leaf(
    leaf: &LeafSpec,
    value: Option<&Value>,
    path: &str,
    ctx: &CheckContext<'_>,
) -> EngineResult<Option<Value>> {
    // Stored leaves need a stored value; virtual leaves need one or an interceptor.
    if value.is_none() && (!leaf.virtual_field || leaf.read_interceptor.is_none()) {
        return Ok(None);
    }

    let leaf_ctx = ctx.at_field(value);
    let allowed = evaluate(leaf.checks.read.as_ref(), &leaf_ctx).map_err(|e| EngineError::check(path, e))?;
    if !allowed {
        trace!(path = %path, "leaf read denied");
        return Ok(None);
    }

    match (&leaf.read_interceptor, value) {
        (Some(interceptor), _) => interceptor
            .apply(value, &leaf_ctx)
            .map(Some)
            .map_err(|e| EngineError::check(path, e)),
        (None, Some(raw)) => Ok(Some(raw.clone())),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{rules, CheckFailure, Interceptor, Predicate, Requester};
    use crate::universe::UniverseState;
    use serde_json::json;

    fn run(schema: &ObjectSchema, doc: &Value, user: &Requester) -> EngineResult<Value> {
        let universe = UniverseState::default();
        let ctx = CheckContext::for_target(user, Some(doc), &universe);
        project(schema, doc, &ctx)
    }

    #[test]
    fn test_denied_leaf_is_omitted() {
        let schema = ObjectSchema::new(
            "thing",
            Node::group()
                .read(true)
                .field("a", Node::leaf().read(true))
                .field("b", Node::leaf().read(false)),
        )
        .unwrap();

        let out = run(&schema, &json!({"a": 1, "b": 2}), &Requester::anonymous()).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_gated_group_emits_empty_object() {
        let schema = ObjectSchema::new(
            "vault",
            Node::group().read(true).field(
                "secret",
                Node::group()
                    .read(rules::admin_only())
                    .field("value", Node::leaf().read(true)),
            ),
        )
        .unwrap();
        let doc = json!({"secret": {"value": 42}});

        let out = run(&schema, &doc, &Requester::hacker("h")).unwrap();
        assert_eq!(out, json!({"secret": {}}));

        let out = run(&schema, &doc, &Requester::admin("a")).unwrap();
        assert_eq!(out, json!({"secret": {"value": 42}}));
    }

    #[test]
    fn test_closed_root_yields_empty_object() {
        let schema = ObjectSchema::new("x", Node::group().field("a", Node::leaf().read(true))).unwrap();
        assert_eq!(run(&schema, &json!({"a": 1}), &Requester::admin("a")).unwrap(), json!({}));
    }

    #[test]
    fn test_output_follows_schema_order() {
        let schema = ObjectSchema::new(
            "x",
            Node::group()
                .read(true)
                .field("z", Node::leaf().read(true))
                .field("a", Node::leaf().read(true)),
        )
        .unwrap();

        let out = run(&schema, &json!({"a": 1, "z": 2}), &Requester::anonymous()).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_undeclared_and_missing_keys_are_dropped() {
        let schema = ObjectSchema::new(
            "x",
            Node::group()
                .read(true)
                .field("a", Node::leaf().read(true))
                .field("g", Node::group().read(true).field("b", Node::leaf().read(true))),
        )
        .unwrap();

        let out = run(&schema, &json!({"a": 1, "internal": "hidden"}), &Requester::anonymous()).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_interceptor_runs_after_read_passes() {
        let schema = ObjectSchema::new(
            "x",
            Node::group()
                .read(true)
                .field("token", Node::leaf().read(true).intercept(rules::redact("[hidden]")))
                .field(
                    "never",
                    Node::leaf()
                        .read(false)
                        .intercept(Interceptor::try_new(|_, _| Err(CheckFailure::new("must not run")))),
                ),
        )
        .unwrap();

        let out = run(&schema, &json!({"token": "abc", "never": 1}), &Requester::anonymous()).unwrap();
        assert_eq!(out, json!({"token": "[hidden]"}));
    }

    #[test]
    fn test_virtual_leaf_derived_by_interceptor() {
        let schema = ObjectSchema::new(
            "x",
            Node::group()
                .read(true)
                .field("first", Node::leaf().read(true))
                .field(
                    "greeting",
                    Node::leaf().read(true).virtual_field().intercept(Interceptor::new(|_, ctx| {
                        let first = ctx.target_at("first").and_then(Value::as_str).unwrap_or("");
                        json!(format!("Hello, {}", first))
                    })),
                ),
        )
        .unwrap();

        let out = run(&schema, &json!({"first": "Ada"}), &Requester::anonymous()).unwrap();
        assert_eq!(out, json!({"first": "Ada", "greeting": "Hello, Ada"}));
    }

    #[test]
    fn test_failing_predicate_is_an_error() {
        let schema = ObjectSchema::new(
            "x",
            Node::group().read(true).field(
                "a",
                Node::leaf().read(Predicate::try_when(|_| Err(CheckFailure::new("broken")))),
            ),
        )
        .unwrap();

        let err = run(&schema, &json!({"a": 1}), &Requester::admin("a")).unwrap_err();
        assert!(matches!(err, EngineError::Check { ref path, .. } if path == "a"));
    }

    #[test]
    fn test_leaf_check_sees_field_value() {
        let schema = ObjectSchema::new(
            "x",
            Node::group()
                .read(true)
                .field("n", Node::leaf().read(Predicate::when(|ctx| ctx.field_value == Some(&json!(1))))),
        )
        .unwrap();

        assert_eq!(run(&schema, &json!({"n": 1}), &Requester::anonymous()).unwrap(), json!({"n": 1}));
        assert_eq!(run(&schema, &json!({"n": 2}), &Requester::anonymous()).unwrap(), json!({}));
    }
}
