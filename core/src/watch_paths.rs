//! Derivation of watchable paths from a schema.
//!
//! Object nodes are flattened; every other node (leaf predicates and arrays,
//! whatever their element schema) terminates a path. Array fields are therefore
//! watched as a whole and never descended into.

use indexmap::IndexMap;
use vigil_types::Schema;

/// Dot-joined paths to every watchable node of `schema`, in schema order.
///
/// Only object roots produce paths; a leaf or array root has nothing to watch
/// below it.
#[must_use]
pub fn watch_properties(schema: &Schema) -> Vec<String> {
    let mut paths = Vec::new();
    if let Schema::Object(fields) = schema {
        collect(fields, &mut Vec::new(), &mut paths);
    }
    paths
}

fn collect<'a>(
    fields: &'a IndexMap<String, Schema>,
    prefix: &mut Vec<&'a str>,
    out: &mut Vec<String>,
) {
    for (key, node) in fields {
        prefix.push(key);
        match node {
            Schema::Object(children) => collect(children, prefix, out),
            Schema::Leaf(_) | Schema::Array(_) => out.push(prefix.join(".")),
        }
        prefix.pop();
    }
}
