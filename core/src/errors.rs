//! Errors raised by model construction, mutation, and guarding.

use thiserror::Error;
use vigil_types::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("undefined model data")]
    MissingData,
    #[error("attempting to create a model from a model")]
    ModelFromModel,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "store is immutable! Updates must happen within a method or computed setter (changed: {path})"
    )]
    Immutable { path: String },
    #[error("mutex is off ({count}), this should never happen")]
    MutexCorrupted { count: i64 },
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("method '{0}' is async; use call_async")]
    AsyncMethod(String),
    #[error("unknown computed property '{0}'")]
    UnknownComputed(String),
    #[error("computed property '{0}' has no setter")]
    ReadOnlyComputed(String),
    #[error("model has been dropped")]
    Detached,
    #[error("{0}")]
    Custom(String),
}

impl ModelError {
    /// Error raised from user code (methods, setters, watchers).
    pub fn custom(message: impl Into<String>) -> Self {
        ModelError::Custom(message.into())
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this is a mutation-guard violation.
    #[must_use]
    pub fn is_guard_violation(&self) -> bool {
        matches!(
            self,
            ModelError::Immutable { .. } | ModelError::MutexCorrupted { .. }
        )
    }
}
