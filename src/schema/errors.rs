//! Schema configuration errors
//!
//! These describe a misconfigured schema tree or registry. They are raised at
//! startup while registering object types, never during a request.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema misconfiguration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Object type name is empty
    #[error("object type name must not be empty")]
    EmptyObjectType,

    /// Field name is empty or contains a path separator
    #[error("invalid field name at '{path}' in '{object_type}'")]
    InvalidFieldName { object_type: String, path: String },

    /// Two siblings share a name
    #[error("duplicate field '{path}' in '{object_type}'")]
    DuplicateField { object_type: String, path: String },

    /// Object type registered twice; registered schemas are immutable
    #[error("object type '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl SchemaError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyObjectType => "FG_SCHEMA_EMPTY_TYPE",
            Self::InvalidFieldName { .. } => "FG_SCHEMA_INVALID_FIELD",
            Self::DuplicateField { .. } => "FG_SCHEMA_DUPLICATE_FIELD",
            Self::AlreadyRegistered(_) => "FG_SCHEMA_IMMUTABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::EmptyObjectType.code(), "FG_SCHEMA_EMPTY_TYPE");
        assert_eq!(
            SchemaError::AlreadyRegistered("user".into()).code(),
            "FG_SCHEMA_IMMUTABLE"
        );
    }

    #[test]
    fn test_display_includes_path() {
        let err = SchemaError::DuplicateField {
            object_type: "user".into(),
            path: "profile.name".into(),
        };
        assert!(err.to_string().contains("profile.name"));
        assert!(err.to_string().contains("user"));
    }
}
