//! Core domain types for Vigil.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! schema trees, leaf predicates, diagnostic data paths, and the validation error
//! taxonomy. Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod error;
mod path;
mod schema;

pub use error::{ValidationError, describe};
pub use path::{DataPath, PathSegment};
pub use schema::{Predicate, Schema};

use serde_json::Value;

/// Key under which a constructed model's handle records its registered name.
///
/// Data trees carry other models by embedding their handle, a single-entry
/// object `{ MODEL_MARKER: "<name>" }`.
pub const MODEL_MARKER: &str = "__vigil_model__";

/// Name used for models constructed without one.
pub const ANONYMOUS_MODEL: &str = "anonymous";

/// Registered name of the model a value refers to, if it is a model handle.
#[must_use]
pub fn model_name(value: &Value) -> Option<&str> {
    value.as_object()?.get(MODEL_MARKER)?.as_str()
}

/// Whether a value is object-shaped: a mapping, not an array and not null.
#[must_use]
pub fn is_object_shaped(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(_)))
}
