//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{Value, json};
use vigil_core::predicates::{maybe_null, number, string};
use vigil_core::{Environment, ModelOptions, Schema, StoreOptions};

/// Options pinned to development so tests never depend on `VIGIL_ENV`.
pub fn dev() -> ModelOptions {
    ModelOptions::default().environment(Environment::Development)
}

pub fn prod() -> ModelOptions {
    ModelOptions::default().environment(Environment::Production)
}

/// `{publishers: [{id: string, name: string}]}`
pub fn publishers_schema() -> Schema {
    Schema::object([(
        "publishers",
        Schema::array_of(Schema::object([("id", string()), ("name", string())])),
    )])
}

pub fn publishers_data() -> Value {
    json!({
        "publishers": [
            {"id": "p1", "name": "Penguin"},
            {"id": "p2", "name": "Tor"}
        ]
    })
}

/// A store whose `addPublisher` method pushes its first argument.
pub fn publishers_store() -> StoreOptions {
    StoreOptions::new(publishers_data())
        .name("store")
        .schema(publishers_schema())
        .method("addPublisher", |m, args| {
            let publisher = args.first().cloned().unwrap_or(Value::Null);
            m.push("publishers", publisher)?;
            Ok(Value::Null)
        })
        .method("replacePublishers", |m, args| {
            m.set("publishers", args.first().cloned().unwrap_or(Value::Null))?;
            Ok(Value::Null)
        })
}

/// A user profile with nested objects and a nullable field.
pub fn profile_schema() -> Schema {
    Schema::object([
        ("id", Schema::from(number())),
        (
            "profile",
            Schema::object([
                ("name", Schema::from(string())),
                ("nickname", Schema::from(maybe_null(string()))),
            ]),
        ),
        ("tags", Schema::array_of(string())),
    ])
}

pub fn profile_data() -> Value {
    json!({
        "id": 7,
        "profile": {"name": "Ada", "nickname": null},
        "tags": ["admin"]
    })
}

/// Write `body` to `name` inside `dir`.
pub fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, body).unwrap();
    path
}
