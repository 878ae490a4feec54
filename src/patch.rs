//! Dot-path patches
//!
//! A patch is a flat, ordered map of dot-delimited paths to values:
//!
//! ```json
//! {"application.first_name": "Ada", "status.applied": true}
//! ```
//!
//! [`apply_patch`] writes each value at its path, creating missing
//! intermediate objects and replacing intermediates that are not objects.
//! It knows nothing about authorization; callers patch only what they have
//! already validated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat map of dot paths to new values, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DotPatch {
    entries: Map<String, Value>,
}

impl DotPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`, replacing an earlier value for the same path
    pub fn set(&mut self, path: impl Into<String>, value: Value) {
        self.entries.insert(path.into(), value);
    }

    pub fn with(mut self, path: impl Into<String>, value: Value) -> Self {
        self.set(path, value);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for DotPatch {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Apply every entry of `patch` to `target`
pub fn apply_patch(target: &mut Value, patch: &DotPatch) {
    for (path, value) in patch.iter() {
        set_path(target, path, value.clone());
    }
}

/// Set one dot path inside `target`
fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = match segments.pop() {
        Some(last) => last,
        None => return,
    };

    let mut current = target;
    for segment in segments {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert(last.to_string(), value);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}
