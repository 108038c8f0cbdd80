//! Schemas authored as data.
//!
//! A descriptor is a JSON value resolved against the type registry:
//!
//! | Descriptor                   | Schema                              |
//! |------------------------------|-------------------------------------|
//! | `"number"`                   | registered predicate `number`       |
//! | `{"$enum": [..literals]}`    | [`enumeration`]                     |
//! | `{"$union": [..leaves]}`     | [`union`] of leaf descriptors       |
//! | `{"$maybeNull": d}`          | [`maybe_null`] of `d`               |
//! | `{"$model": "name"}`         | [`model`] reference                 |
//! | `{"field": d, ..}`           | object node                         |
//! | `[]` / `[d]`                 | untyped / homogeneous array node    |
//!
//! Anything else (null, booleans, numbers, unknown names, arrays with more
//! than one entry, stray `$` keys) is an invalid schema at the descriptor
//! path where it was found, rooted at `[schema]`.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use vigil_types::{DataPath, Predicate, Schema, ValidationError};

use crate::predicates::{enumeration, lookup, maybe_null, model, union};

const ROOT_LABEL: &str = "schema";

/// Resolve a descriptor into a schema.
pub fn parse_schema(descriptor: &Value) -> Result<Schema, ValidationError> {
    parse_node(descriptor, &DataPath::root(ROOT_LABEL))
}

fn parse_node(descriptor: &Value, path: &DataPath) -> Result<Schema, ValidationError> {
    match descriptor {
        Value::String(name) => lookup(name).map(Schema::Leaf).ok_or_else(|| invalid(path)),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(Schema::any_array()),
            [element] => Ok(Schema::array_of(parse_node(element, &path.index(0))?)),
            _ => Err(invalid(path)),
        },
        Value::Object(map) => match reserved(map) {
            Some((key, inner)) => parse_reserved(key, inner, &path.key(key)).map(Schema::Leaf),
            None => parse_object(map, path),
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => Err(invalid(path)),
    }
}

fn reserved(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((key, inner)), None) if key.starts_with('$') => Some((key.as_str(), inner)),
        _ => None,
    }
}

fn parse_object(map: &Map<String, Value>, path: &DataPath) -> Result<Schema, ValidationError> {
    let mut fields = IndexMap::with_capacity(map.len());
    for (key, child) in map {
        let child_path = path.key(key);
        if key.starts_with('$') {
            return Err(invalid(&child_path));
        }
        fields.insert(key.clone(), parse_node(child, &child_path)?);
    }
    Ok(Schema::Object(fields))
}

fn parse_reserved(key: &str, inner: &Value, path: &DataPath) -> Result<Predicate, ValidationError> {
    match key {
        "$enum" => {
            let literals = inner.as_array().ok_or_else(|| invalid(path))?;
            if literals.iter().any(|v| v.is_array() || v.is_object()) {
                return Err(invalid(path));
            }
            Ok(enumeration(literals.iter().cloned()))
        }
        "$union" => {
            let members = inner.as_array().ok_or_else(|| invalid(path))?;
            let members = members
                .iter()
                .enumerate()
                .map(|(i, member)| match parse_node(member, &path.index(i))? {
                    Schema::Leaf(predicate) => Ok(predicate),
                    Schema::Object(_) | Schema::Array(_) => Err(invalid(&path.index(i))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(union(members))
        }
        "$maybeNull" => {
            if inner.is_null() {
                return Err(ValidationError::MissingArgument("maybeNull"));
            }
            Ok(maybe_null(parse_node(inner, path)?))
        }
        "$model" => inner.as_str().map(model).ok_or_else(|| invalid(path)),
        _ => Err(invalid(path)),
    }
}

fn invalid(path: &DataPath) -> ValidationError {
    ValidationError::InvalidSchema { path: path.clone() }
}
