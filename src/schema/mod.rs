//! Schema trees for field-level access control
//!
//! Every object type is described once, at startup, by a tree of leaves and
//! groups annotated with authorization predicates and read interceptors.
//!
//! # Design Principles
//!
//! - Empty check slots deny
//! - A group's gate dominates all of its descendants
//! - Trees are immutable once registered
//! - Virtual leaves are projected but never persisted

mod context;
mod errors;
mod predicate;
mod registry;
pub mod rules;
mod types;

pub use context::{lookup_path, CheckContext, Requester, Roles};
pub use errors::{SchemaError, SchemaResult};
pub use predicate::{evaluate, CheckFailure, CheckFn, InterceptFn, Interceptor, Predicate};
pub use registry::SchemaRegistry;
pub use types::{make_path, Checks, GroupSpec, LeafSpec, Node, ObjectSchema};
