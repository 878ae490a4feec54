//! Write validation
//!
//! Walks the schema tree in lock-step with a submission. Group gates are
//! evaluated outside-in: a closed gate records one violation and its subtree
//! is skipped. Below open gates every leaf is checked and every refusal is
//! accumulated. Accepted leaves become entries of a [`DotPatch`].
//!
//! Validation never touches the store. The caller persists the patch only
//! when the violation list is empty.

use serde_json::{Map, Value};
use tracing::trace;

use super::errors::{EngineError, EngineResult, Violation};
use crate::patch::DotPatch;
use crate::schema::{evaluate, make_path, CheckContext, GroupSpec, Node, ObjectSchema};

/// Outcome of validating one submission against one target
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub violations: Vec<Violation>,
    /// Accepted leaves as dot-path entries
    pub patch: DotPatch,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate `submission` for the requester and target in `ctx`.
///
/// With `submit` set, a node's `submit` gate replaces its `write` gate where
/// declared. Failing predicates abort with [`EngineError::Check`].
pub fn validate(
    schema: &ObjectSchema,
    submission: &Value,
    ctx: &CheckContext<'_>,
    submit: bool,
) -> EngineResult<Validation> {
    let root = schema.root();
    let gate = evaluate(root.checks.effective_write(submit), ctx)
        .map_err(|e| EngineError::check(schema.object_type(), e))?;
    if !gate {
        let caption = root.caption.as_deref().unwrap_or(schema.object_type());
        trace!(object_type = schema.object_type(), "root write gate closed");
        return Ok(Validation {
            violations: vec![Violation::new(schema.object_type(), caption)],
            patch: DotPatch::new(),
        });
    }

    validate_fields(schema, submission, ctx, submit)
}

/// Validate the children of the root without evaluating the root gate.
///
/// Create paths use this after the root `create` check has passed.
pub fn validate_fields(
    schema: &ObjectSchema,
    submission: &Value,
    ctx: &CheckContext<'_>,
    submit: bool,
) -> EngineResult<Validation> {
    let mut validation = Validation::default();
    let root = schema.root();

    match submission {
        Value::Object(fields) => validate_group(root, fields, "", ctx, submit, &mut validation)?,
        _ => {
            let caption = root.caption.as_deref().unwrap_or(schema.object_type());
            validation
                .violations
                .push(Violation::new(schema.object_type(), caption));
        }
    }

    Ok(validation)
}

fn validate_group(
    group: &GroupSpec,
    fields: &Map<String, Value>,
    prefix: &str,
    ctx: &CheckContext<'_>,
    submit: bool,
    out: &mut Validation,
) -> EngineResult<()> {
    for (name, node) in &group.fields {
        let Some(value) = fields.get(name) else {
            continue;
        };
        let path = make_path(prefix, name);
        let caption = node.caption().unwrap_or(name.as_str());

        match node {
            Node::Leaf(leaf) => {
                if leaf.virtual_field {
                    trace!(path = %path, "virtual leaf is not writable");
                    out.violations.push(Violation::new(path, caption));
                    continue;
                }

                let allowed = evaluate(leaf.checks.effective_write(submit), &ctx.at_field(Some(value)))
                    .map_err(|e| EngineError::check(&path, e))?;
                if allowed {
                    out.patch.set(path, value.clone());
                } else {
                    trace!(path = %path, "leaf write denied");
                    out.violations.push(Violation::new(path, caption));
                }
            }
            Node::Group(child) => {
                let Value::Object(child_fields) = value else {
                    out.violations.push(Violation::new(path, caption));
                    continue;
                };

                let gate = evaluate(child.checks.effective_write(submit), &ctx.at_field(None))
                    .map_err(|e| EngineError::check(&path, e))?;
                if gate {
                    validate_group(child, child_fields, &path, ctx, submit, out)?;
                } else {
                    trace!(path = %path, "group write gate closed");
                    out.violations.push(Violation::new(path, caption));
                }
            }
        }
    }

    for key in fields.keys() {
        if group.child(key).is_none() {
            out.violations.push(Violation::new(make_path(prefix, key), key.as_str()));
        }
    }

    Ok(())
}
