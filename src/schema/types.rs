//! Schema tree definitions
//!
//! An object type is described by a tree of nodes:
//! - leaf: a primitive field (any JSON value stored at one key)
//! - group: a nested object owning an ordered list of named children
//!
//! Every node carries optional check slots. An empty slot denies.

use super::errors::{SchemaError, SchemaResult};
use super::predicate::{Interceptor, Predicate};

/// Authorization slots shared by leaves and groups
#[derive(Debug, Clone, Default)]
pub struct Checks {
    pub create: Option<Predicate>,
    pub read: Option<Predicate>,
    pub write: Option<Predicate>,
    pub submit: Option<Predicate>,
    pub delete: Option<Predicate>,
}

impl Checks {
    /// Gate for a write traversal: `submit` when present in submit mode,
    /// `write` otherwise
    pub fn effective_write(&self, submit: bool) -> Option<&Predicate> {
        match (&self.submit, submit) {
            (Some(predicate), true) => Some(predicate),
            _ => self.write.as_ref(),
        }
    }
}

/// Primitive field
#[derive(Debug, Clone, Default)]
pub struct LeafSpec {
    pub checks: Checks,
    pub caption: Option<String>,
    pub read_interceptor: Option<Interceptor>,
    /// No backing storage; value is derived on read
    pub virtual_field: bool,
}

/// Nested object
#[derive(Debug, Clone, Default)]
pub struct GroupSpec {
    pub checks: Checks,
    pub caption: Option<String>,
    /// Children in declared order
    pub fields: Vec<(String, Node)>,
}

/// Schema tree node
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafSpec),
    Group(GroupSpec),
}

impl Node {
    pub fn leaf() -> LeafSpec {
        LeafSpec::default()
    }

    pub fn group() -> GroupSpec {
        GroupSpec::default()
    }

    pub fn checks(&self) -> &Checks {
        match self {
            Node::Leaf(leaf) => &leaf.checks,
            Node::Group(group) => &group.checks,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            Node::Leaf(leaf) => leaf.caption.as_deref(),
            Node::Group(group) => group.caption.as_deref(),
        }
    }
}

impl From<LeafSpec> for Node {
    fn from(leaf: LeafSpec) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<GroupSpec> for Node {
    fn from(group: GroupSpec) -> Self {
        Node::Group(group)
    }
}

impl LeafSpec {
    pub fn read(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.read = Some(predicate.into());
        self
    }

    pub fn write(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.write = Some(predicate.into());
        self
    }

    pub fn submit(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.submit = Some(predicate.into());
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn intercept(mut self, interceptor: Interceptor) -> Self {
        self.read_interceptor = Some(interceptor);
        self
    }

    /// Mark the leaf as derived (no storage column)
    pub fn virtual_field(mut self) -> Self {
        self.virtual_field = true;
        self
    }
}

impl GroupSpec {
    pub fn create(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.create = Some(predicate.into());
        self
    }

    pub fn read(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.read = Some(predicate.into());
        self
    }

    pub fn write(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.write = Some(predicate.into());
        self
    }

    pub fn submit(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.submit = Some(predicate.into());
        self
    }

    pub fn delete(mut self, predicate: impl Into<Predicate>) -> Self {
        self.checks.delete = Some(predicate.into());
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Append a child; declaration order is output order
    pub fn field(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.fields.push((name.into(), node.into()));
        self
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, node)| node)
    }
}

/// Registered object type: a name plus its root group
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    object_type: String,
    root: GroupSpec,
}

impl ObjectSchema {
    /// Create an object schema, validating the tree structure.
    ///
    /// Field names must be non-empty, free of `.`, and unique among siblings.
    pub fn new(object_type: impl Into<String>, root: GroupSpec) -> SchemaResult<Self> {
        let object_type = object_type.into();
        if object_type.is_empty() {
            return Err(SchemaError::EmptyObjectType);
        }
        validate_group(&object_type, &root, "")?;
        Ok(Self { object_type, root })
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn root(&self) -> &GroupSpec {
        &self.root
    }

    /// Dot paths of every stored leaf, in declared order.
    ///
    /// Virtual leaves are excluded; this is the persistence layout.
    pub fn persisted_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_persisted(&self.root, "", &mut paths);
        paths
    }

    /// Resolve a dot path to a node
    pub fn node_at(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split('.');
        let mut node = self.root.child(segments.next()?)?;
        for segment in segments {
            match node {
                Node::Group(group) => node = group.child(segment)?,
                Node::Leaf(_) => return None,
            }
        }
        Some(node)
    }
}

/// Join a parent path and a key
pub fn make_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn validate_group(object_type: &str, group: &GroupSpec, prefix: &str) -> SchemaResult<()> {
    for (index, (name, node)) in group.fields.iter().enumerate() {
        let path = make_path(prefix, name);
        if name.is_empty() || name.contains('.') {
            return Err(SchemaError::InvalidFieldName {
                object_type: object_type.to_string(),
                path,
            });
        }
        if group.fields[..index].iter().any(|(earlier, _)| earlier == name) {
            return Err(SchemaError::DuplicateField {
                object_type: object_type.to_string(),
                path,
            });
        }
        if let Node::Group(child) = node {
            validate_group(object_type, child, &path)?;
        }
    }
    Ok(())
}

fn collect_persisted(group: &GroupSpec, prefix: &str, out: &mut Vec<String>) {
    for (name, node) in &group.fields {
        let path = make_path(prefix, name);
        match node {
            Node::Leaf(leaf) if leaf.virtual_field => {}
            Node::Leaf(_) => out.push(path),
            Node::Group(child) => collect_persisted(child, &path, out),
        }
    }
}
