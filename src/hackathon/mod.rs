//! Hackathon object types
//!
//! The schema trees of the hackathon backend, registered together.

pub mod user;

use crate::schema::{SchemaRegistry, SchemaResult};

/// Registry holding every hackathon object type
pub fn registry() -> SchemaResult<SchemaRegistry> {
    SchemaRegistry::new().with(user::OBJECT_TYPE, user::schema())
}
