use serde_json::Value;
use thiserror::Error;

use crate::path::DataPath;

/// Failures raised while checking data against a schema, or while authoring one.
///
/// Every variant carries the [`DataPath`] of the offending node. Variants with
/// a `got` field hold a JSON rendering of the value that was found there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid schema at path {path}")]
    InvalidSchema { path: DataPath },
    #[error("undefined data property at path {path}")]
    UndefinedProperty { path: DataPath },
    #[error("expected array at path {path}. Got: {got}")]
    ExpectedArray { path: DataPath, got: String },
    #[error("expected object at path {path}. Got: {got}")]
    ExpectedObject { path: DataPath, got: String },
    #[error("check failed for data property at path {path}. Got: {got}")]
    CheckFailed { path: DataPath, got: String },
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

impl ValidationError {
    /// Path of the node that failed, if the error is tied to one.
    #[must_use]
    pub fn path(&self) -> Option<&DataPath> {
        match self {
            ValidationError::InvalidSchema { path }
            | ValidationError::UndefinedProperty { path }
            | ValidationError::ExpectedArray { path, .. }
            | ValidationError::ExpectedObject { path, .. }
            | ValidationError::CheckFailed { path, .. } => Some(path),
            ValidationError::MissingArgument(_) => None,
        }
    }
}

/// JSON rendering of a value for error messages; absent values print as `undefined`.
#[must_use]
pub fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
        None => "undefined".to_string(),
    }
}
