//! Schema trees.
//!
//! A schema is an immutable tree with three node kinds:
//!
//! - [`Schema::Leaf`]: a [`Predicate`] deciding whether a single value is valid.
//! - [`Schema::Object`]: an ordered mapping of field name to sub-schema.
//! - [`Schema::Array`]: an array whose elements all match one optional
//!   sub-schema (`None` accepts any contents).
//!
//! Field order is the insertion order of the mapping; validation and watch-path
//! derivation both follow it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ValidationError;
use crate::path::DataPath;

type CheckFn = dyn Fn(&Value, &DataPath) -> Result<bool, ValidationError> + Send + Sync;

/// A named leaf check over a single value.
///
/// Most predicates are plain `value -> bool` tests. Predicates built with
/// [`Predicate::with_path`] also see the location being checked and may raise
/// a [`ValidationError`] of their own (this is how nullable wrappers around
/// nested schemas delegate to full structural validation).
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    check: Arc<CheckFn>,
}

impl Predicate {
    pub fn new(
        name: impl AsRef<str>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            check: Arc::new(move |value, _| Ok(check(value))),
        }
    }

    pub fn with_path(
        name: impl AsRef<str>,
        check: impl Fn(&Value, &DataPath) -> Result<bool, ValidationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            check: Arc::new(check),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, value: &Value, path: &DataPath) -> Result<bool, ValidationError> {
        (self.check)(value, path)
    }

    /// Ad hoc test outside of any model. Raised errors count as a mismatch.
    #[must_use]
    pub fn test(&self, value: &Value) -> bool {
        matches!(self.check(value, &DataPath::root(self.name())), Ok(true))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum Schema {
    Leaf(Predicate),
    Object(IndexMap<String, Schema>),
    Array(Option<Box<Schema>>),
}

impl Schema {
    /// Object node from `(field, schema)` pairs, keeping their order.
    pub fn object<K, S>(fields: impl IntoIterator<Item = (K, S)>) -> Self
    where
        K: Into<String>,
        S: Into<Schema>,
    {
        Schema::Object(
            fields
                .into_iter()
                .map(|(key, schema)| (key.into(), schema.into()))
                .collect(),
        )
    }

    /// Homogeneous array node.
    pub fn array_of(element: impl Into<Schema>) -> Self {
        Schema::Array(Some(Box::new(element.into())))
    }

    /// Array node accepting any contents.
    #[must_use]
    pub fn any_array() -> Self {
        Schema::Array(None)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Schema::Object(_))
    }

    /// Child of an object node.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Schema> {
        match self {
            Schema::Object(fields) => fields.get(key),
            Schema::Leaf(_) | Schema::Array(_) => None,
        }
    }

    /// Sub-schema at a dot-joined path of object keys. The empty path is `self`.
    #[must_use]
    pub fn lookup(&self, dotted: &str) -> Option<&Schema> {
        dotted
            .split('.')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, key| node.field(key))
    }
}

impl From<Predicate> for Schema {
    fn from(predicate: Predicate) -> Self {
        Schema::Leaf(predicate)
    }
}

impl<K: Into<String>> FromIterator<(K, Schema)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, Schema)>>(iter: I) -> Self {
        Schema::object(iter)
    }
}
