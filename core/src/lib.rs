//! Core domain logic for Vigil.
//!
//! Runtime schema validation and controlled mutation for reactive data models:
//!
//! - [`predicates`]: leaf type checks, combinators, and the process-wide registry.
//! - [`validate`]: the recursive structural validator.
//! - [`watch_paths`]: flattening a schema into the paths a model observes.
//! - [`descriptor`]: schemas authored as JSON/TOML data.
//! - [`reactive`]: the observable data tree models are built on.
//! - [`guard`]: the mutation counter that rejects changes made outside
//!   methods and computed setters.
//! - [`model`](mod@model): the factory composing all of the above.
//!
//! Validation and guarding only run outside production (see [`environment`]).

pub mod descriptor;
pub mod environment;
pub mod errors;
pub mod guard;
pub mod model;
pub mod options;
pub mod predicates;
pub mod reactive;
pub mod validate;
pub mod watch_paths;

pub use descriptor::parse_schema;
pub use environment::Environment;
pub use errors::ModelError;
pub use guard::MutationGuard;
pub use model::{Model, is_model, model};
pub use options::{Computed, Method, ModelOptions, StoreOptions};
pub use reactive::{ChangeEvent, FlushMode, ReactiveObject, WatchRegistry};
pub use validate::{deep_type_check, validate};
pub use watch_paths::watch_properties;

pub use vigil_types::{
    ANONYMOUS_MODEL, DataPath, MODEL_MARKER, PathSegment, Predicate, Schema, ValidationError,
};
