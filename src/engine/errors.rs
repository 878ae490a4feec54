//! Engine error types
//!
//! Refusals (the requester may not do this) and internal failures (the
//! engine could not decide) are separate kinds. A predicate that fails is an
//! internal failure, never a refusal.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::schema::{CheckFailure, Requester, SchemaError};
use crate::store::StoreError;
use crate::universe::UniverseError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// One refused field in a write or submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dot path of the refused node
    pub path: String,
    /// Caption of the node, or its key when it has none
    pub caption: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: caption.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.caption, self.path)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.caption.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown object type '{0}'")]
    InvalidObjectType(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not allowed to create '{object_type}'")]
    CreateDenied { object_type: String },

    #[error("not allowed to modify: {}", join_violations(.violations))]
    WriteDenied {
        object_type: String,
        violations: Vec<Violation>,
    },

    #[error("submission rejected: {}", join_violations(.violations))]
    SubmissionDenied {
        object_type: String,
        violations: Vec<Violation>,
    },

    #[error("not allowed to delete '{object_type}'")]
    DeleteDenied { object_type: String },

    #[error("'{object_type}' not found")]
    NotFound { object_type: String },

    /// A predicate or interceptor failed to evaluate
    #[error("check at '{path}' failed: {source}")]
    Check {
        path: String,
        #[source]
        source: CheckFailure,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl EngineError {
    pub fn check(path: impl Into<String>, source: CheckFailure) -> Self {
        Self::Check {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidObjectType(_) => "FG_INVALID_OBJECT_TYPE",
            Self::BadRequest(_) => "FG_BAD_REQUEST",
            Self::CreateDenied { .. } => "FG_CREATE_DENIED",
            Self::WriteDenied { .. } => "FG_WRITE_DENIED",
            Self::SubmissionDenied { .. } => "FG_SUBMISSION_DENIED",
            Self::DeleteDenied { .. } => "FG_DELETE_DENIED",
            Self::NotFound { .. } => "FG_NOT_FOUND",
            Self::Check { .. } => "FG_CHECK_FAILED",
            Self::Store(e) => e.code(),
            Self::Universe(e) => e.code(),
            Self::Schema(e) => e.code(),
        }
    }

    /// HTTP-style status for the outer routing layer
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidObjectType(_) | Self::BadRequest(_) => 400,
            Self::CreateDenied { .. }
            | Self::WriteDenied { .. }
            | Self::SubmissionDenied { .. }
            | Self::DeleteDenied { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Store(StoreError::InvalidFilter(_)) => 400,
            Self::Universe(_) | Self::Store(StoreError::Unavailable(_)) => 503,
            Self::Check { .. } | Self::Store(_) | Self::Schema(_) => 500,
        }
    }

    /// The requester asked for something they may not do
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::CreateDenied { .. }
                | Self::WriteDenied { .. }
                | Self::SubmissionDenied { .. }
                | Self::DeleteDenied { .. }
        )
    }

    /// The engine or a collaborator failed
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Violations carried by a write or submission refusal
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::WriteDenied { violations, .. } | Self::SubmissionDenied { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Message safe to show to `requester`.
    ///
    /// Submission refusals are shown to everyone so applicants can fix their
    /// form. Other refusals name fields only to privileged requesters.
    /// Internal failures are never detailed to unprivileged requesters.
    pub fn public_message(&self, requester: &Requester, generic: &str) -> String {
        match self {
            Self::SubmissionDenied { .. } => self.to_string(),
            _ if requester.is_privileged() => self.to_string(),
            Self::InvalidObjectType(_) | Self::BadRequest(_) | Self::NotFound { .. } => self.to_string(),
            _ => generic.to_string(),
        }
    }
}
