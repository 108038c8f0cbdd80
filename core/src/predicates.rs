//! The type predicate library.
//!
//! Builtin leaf checks ([`boolean`], [`number`], [`string`]), combinators
//! ([`enumeration`], [`union`], [`maybe_null`]), cross-model references
//! ([`model`]), and the process-wide named registry schema descriptors resolve
//! type names against.
//!
//! The registry lives for the whole process. It starts with the builtins and
//! grows only through [`register`]; nothing else mutates it.

use std::collections::BTreeMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde_json::Value;
use vigil_types::{Predicate, Schema, model_name};

use crate::validate::deep_type_check;

#[must_use]
pub fn boolean() -> Predicate {
    Predicate::new("boolean", Value::is_boolean)
}

#[must_use]
pub fn number() -> Predicate {
    Predicate::new("number", Value::is_number)
}

#[must_use]
pub fn string() -> Predicate {
    Predicate::new("string", Value::is_string)
}

/// Accepts values equal to one of `literals`.
///
/// Only primitives can match; arrays and objects never equal a literal.
pub fn enumeration(literals: impl IntoIterator<Item = Value>) -> Predicate {
    let literals: Vec<Value> = literals.into_iter().collect();
    let name = format!(
        "enum({})",
        literals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Predicate::new(name, move |value| {
        !value.is_array()
            && !value.is_object()
            && literals.iter().any(|literal| literal_eq(literal, value))
    })
}

/// Numbers compare by numeric value, so `1` and `1.0` are the same literal.
fn literal_eq(literal: &Value, value: &Value) -> bool {
    match (literal, value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => literal == value,
    }
}

/// Accepts values satisfying at least one member.
///
/// A member that raises instead of answering counts as a non-match, so member
/// order never changes the outcome.
pub fn union(members: impl IntoIterator<Item = Predicate>) -> Predicate {
    let members: Vec<Predicate> = members.into_iter().collect();
    let name = format!(
        "union({})",
        members
            .iter()
            .map(Predicate::name)
            .collect::<Vec<_>>()
            .join(" | ")
    );
    Predicate::with_path(name, move |value, path| {
        Ok(members
            .iter()
            .any(|member| matches!(member.check(value, path), Ok(true))))
    })
}

/// Accepts `null`, or whatever `inner` accepts.
///
/// A leaf `inner` is applied directly. A nested object or array schema is
/// handed to full structural validation, whose error propagates unchanged.
pub fn maybe_null(inner: impl Into<Schema>) -> Predicate {
    match inner.into() {
        Schema::Leaf(predicate) => {
            let name = format!("maybeNull({})", predicate.name());
            Predicate::with_path(name, move |value, path| {
                Ok(value.is_null() || predicate.check(value, path)?)
            })
        }
        nested => Predicate::with_path("maybeNull(schema)", move |value, path| {
            if value.is_null() {
                return Ok(true);
            }
            deep_type_check(Some(value), Some(&nested), path)?;
            Ok(true)
        }),
    }
}

/// Accepts handles of constructed models registered under `name`.
///
/// The referenced model validates its own data; this only checks identity.
pub fn model(name: impl Into<String>) -> Predicate {
    let name = name.into();
    Predicate::new(format!("model({name})"), move |value| {
        model_name(value) == Some(name.as_str())
    })
}

/// Named predicates available to schema descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Predicate>,
}

impl TypeRegistry {
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert("boolean", boolean());
        registry.insert("number", number());
        registry.insert("string", string());
        registry
    }

    /// Add or replace a named predicate. Returns the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, predicate: Predicate) -> Option<Predicate> {
        self.types.insert(name.into(), predicate)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

static REGISTRY: LazyLock<RwLock<TypeRegistry>> =
    LazyLock::new(|| RwLock::new(TypeRegistry::with_builtins()));

/// Register a named predicate for the rest of the process.
pub fn register(name: impl Into<String>, predicate: Predicate) {
    let name = name.into();
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if registry.insert(name.clone(), predicate).is_some() {
        tracing::debug!(name = %name, "replaced registered type predicate");
    }
}

/// Look up a registered predicate by name.
#[must_use]
pub fn lookup(name: &str) -> Option<Predicate> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// Names of every registered predicate, sorted.
#[must_use]
pub fn registered_names() -> Vec<String> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .names()
        .map(ToString::to_string)
        .collect()
}
