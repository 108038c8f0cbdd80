//! Structural validation of data trees against a [`Schema`].
//!
//! Validation is depth-first and fail-fast: the first mismatch, in schema key
//! order, is returned and nothing else is examined. Schema keys drive the walk,
//! so data keys the schema does not mention are never looked at.
//!
//! Absent values (a key missing from its object) are distinct from `null`:
//! absence is always an error, while `null` is only accepted by leaf predicates
//! that allow it (see [`crate::predicates::maybe_null`]).

use serde_json::Value;
use vigil_types::{DataPath, Predicate, Schema, ValidationError, describe, is_object_shaped};

/// Check `value` against `schema` at `path`.
///
/// `value` is `None` when the property is absent. `schema` is `None` when the
/// caller resolved a sub-schema that does not exist, which is a schema
/// authoring error rather than a data error.
pub fn deep_type_check(
    value: Option<&Value>,
    schema: Option<&Schema>,
    path: &DataPath,
) -> Result<(), ValidationError> {
    let Some(schema) = schema else {
        return Err(ValidationError::InvalidSchema { path: path.clone() });
    };
    let Some(value) = value else {
        return Err(ValidationError::UndefinedProperty { path: path.clone() });
    };

    match schema {
        Schema::Array(element) => check_array(value, element.as_deref(), path),
        Schema::Object(fields) => {
            let Value::Object(map) = value else {
                return Err(ValidationError::ExpectedObject {
                    path: path.clone(),
                    got: describe(Some(value)),
                });
            };
            for (key, field_schema) in fields {
                let field_value = map.get(key);
                let field_path = path.key(key);
                if field_schema.is_object() && !is_object_shaped(field_value) {
                    return Err(ValidationError::ExpectedObject {
                        path: field_path,
                        got: describe(field_value),
                    });
                }
                deep_type_check(field_value, Some(field_schema), &field_path)?;
            }
            Ok(())
        }
        Schema::Leaf(predicate) => check_leaf(predicate, value, path),
    }
}

/// Validate a whole data tree, rooting diagnostic paths at `[label]`.
pub fn validate(value: &Value, schema: &Schema, label: &str) -> Result<(), ValidationError> {
    deep_type_check(Some(value), Some(schema), &DataPath::root(label))
}

fn check_array(
    value: &Value,
    element: Option<&Schema>,
    path: &DataPath,
) -> Result<(), ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::ExpectedArray {
            path: path.clone(),
            got: describe(Some(value)),
        });
    };
    match element {
        None => Ok(()),
        Some(Schema::Leaf(predicate)) => items
            .iter()
            .enumerate()
            .try_for_each(|(index, item)| check_leaf(predicate, item, &path.index(index))),
        Some(nested) => items.iter().enumerate().try_for_each(|(index, item)| {
            deep_type_check(Some(item), Some(nested), &path.index(index))
        }),
    }
}

fn check_leaf(
    predicate: &Predicate,
    value: &Value,
    path: &DataPath,
) -> Result<(), ValidationError> {
    if predicate.check(value, path)? {
        Ok(())
    } else {
        Err(ValidationError::CheckFailed {
            path: path.clone(),
            got: describe(Some(value)),
        })
    }
}
