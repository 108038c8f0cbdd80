//! Replaying mutation scripts against a guarded model.
//!
//! A script is a JSON array of operations:
//!
//! ```json
//! [
//!   {"op": "set", "path": "id", "value": 2, "guarded": true},
//!   {"op": "push", "path": "tags", "value": "new"},
//!   {"op": "remove", "path": "nickname", "guarded": true}
//! ]
//! ```
//!
//! Guarded operations go through the builtin methods `assign`, `append` and
//! `delete`; the rest mutate the data directly, as code outside the model would.

use std::fmt;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};
use vigil_core::{Model, ModelError, Schema, StoreOptions};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    Set {
        path: String,
        value: Value,
        #[serde(default)]
        guarded: bool,
    },
    Push {
        path: String,
        value: Value,
        #[serde(default)]
        guarded: bool,
    },
    Remove {
        path: String,
        #[serde(default)]
        guarded: bool,
    },
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, path, guarded) = match self {
            Op::Set { path, guarded, .. } => ("set", path, guarded),
            Op::Push { path, guarded, .. } => ("push", path, guarded),
            Op::Remove { path, guarded } => ("remove", path, guarded),
        };
        let how = if *guarded { "guarded" } else { "direct" };
        write!(f, "{name} {path} ({how})")
    }
}

pub fn parse_ops(script: Value) -> Result<Vec<Op>> {
    serde_json::from_value(script).context("ops must be an array of {op, path, value?, guarded?}")
}

/// Store carrying `data` and `schema` plus the builtin mutation methods.
pub fn builtin_store(name: &str, data: Value, schema: Schema) -> StoreOptions {
    StoreOptions::new(data)
        .name(name)
        .schema(schema)
        .method("assign", |model, args| {
            let (path, value) = path_and_value(args)?;
            model.set(path, value)?;
            Ok(Value::Null)
        })
        .method("append", |model, args| {
            let (path, value) = path_and_value(args)?;
            model.push(path, value)?;
            Ok(Value::Null)
        })
        .method("delete", |model, args| {
            let path = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::custom("delete expects a path"))?;
            Ok(model.remove(path)?.unwrap_or(Value::Null))
        })
}

fn path_and_value(args: &[Value]) -> Result<(&str, Value), ModelError> {
    match args {
        [Value::String(path), value] => Ok((path.as_str(), value.clone())),
        _ => Err(ModelError::custom("expected [path, value]")),
    }
}

/// Apply `ops` in order, then flush. Stops at the first failure.
pub fn run(model: &Model, ops: &[Op]) -> Result<()> {
    for (index, op) in ops.iter().enumerate() {
        apply(model, op).with_context(|| format!("op {index}: {op}"))?;
        tracing::debug!(index, %op, mutex = ?model.mutex(), "op applied");
    }
    model.flush().context("flush")?;
    if let Some(count) = model.mutex().filter(|count| *count != 0) {
        bail!("{count} guarded mutation(s) never landed");
    }
    Ok(())
}

fn apply(model: &Model, op: &Op) -> Result<(), ModelError> {
    match op {
        Op::Set {
            path,
            value,
            guarded: true,
        } => model.call("assign", &[json!(path), value.clone()]).map(drop),
        Op::Set { path, value, .. } => model.set(path, value.clone()),
        Op::Push {
            path,
            value,
            guarded: true,
        } => model.call("append", &[json!(path), value.clone()]).map(drop),
        Op::Push { path, value, .. } => model.push(path, value.clone()),
        Op::Remove {
            path,
            guarded: true,
        } => model.call("delete", &[json!(path)]).map(drop),
        Op::Remove { path, .. } => model.remove(path).map(drop),
    }
}
