//! Schemas authored as data

use serde_json::json;
use vigil_core::predicates::register;
use vigil_core::{
    Predicate, Schema, StoreOptions, ValidationError, model, parse_schema, validate,
    watch_properties,
};

use crate::common::{dev, profile_data};

#[test]
fn descriptor_matches_hand_built_schema() {
    let schema = parse_schema(&json!({
        "id": "number",
        "profile": {"name": "string", "nickname": {"$maybeNull": "string"}},
        "tags": ["string"]
    }))
    .unwrap();
    assert_eq!(
        watch_properties(&schema),
        ["id", "profile.name", "profile.nickname", "tags"]
    );
    validate(&profile_data(), &schema, "user").unwrap();
}

#[test]
fn custom_registered_types_are_usable() {
    register(
        "descriptor_suite_email",
        Predicate::new("email", |v| v.as_str().is_some_and(|s| s.contains('@'))),
    );
    let schema = parse_schema(&json!({"email": "descriptor_suite_email"})).unwrap();
    validate(&json!({"email": "a@b.c"}), &schema, "u").unwrap();
    let err = validate(&json!({"email": "nope"}), &schema, "u").unwrap_err();
    assert_eq!(
        err.to_string(),
        "check failed for data property at path [u].email. Got: \"nope\""
    );
}

#[test]
fn descriptor_schema_drives_a_model() {
    let schema = parse_schema(&json!({
        "status": {"$enum": ["draft", "published"]},
        "owner": {"$model": "user"}
    }))
    .unwrap();
    let store = StoreOptions::new(json!({"status": "draft", "owner": {"__vigil_model__": "user"}}))
        .name("doc")
        .schema(schema)
        .method("publish", |m, _| {
            m.set("status", json!("published"))?;
            Ok(json!(null))
        })
        .method("archive", |m, _| {
            m.set("status", json!("archived"))?;
            Ok(json!(null))
        });
    let doc = model(store, dev()).unwrap();
    doc.call("publish", &[]).unwrap();
    let err = doc.call("archive", &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "check failed for data property at path [doc].status. Got: \"archived\""
    );
}

#[test]
fn invalid_descriptors_name_their_location() {
    let cases = [
        (json!({"a": {"b": 1}}), "invalid schema at path [schema].a.b"),
        (json!({"a": ["string", "string"]}), "invalid schema at path [schema].a"),
        (json!({"a": [{"b": "nope"}]}), "invalid schema at path [schema].a[0].b"),
        (json!({"a": {"$model": 3}}), "invalid schema at path [schema].a.$model"),
    ];
    for (descriptor, message) in cases {
        assert_eq!(parse_schema(&descriptor).unwrap_err().to_string(), message);
    }
}

#[test]
fn maybe_null_requires_an_argument() {
    assert_eq!(
        parse_schema(&json!({"$maybeNull": null})).unwrap_err(),
        ValidationError::MissingArgument("maybeNull")
    );
}

#[test]
fn top_level_array_descriptor() {
    let schema = parse_schema(&json!([{"id": "number"}])).unwrap();
    assert!(matches!(schema, Schema::Array(Some(_))));
    validate(&json!([{"id": 1}, {"id": 2}]), &schema, "list").unwrap();
    let err = validate(&json!([{"id": 1}, {}]), &schema, "list").unwrap_err();
    assert_eq!(err.to_string(), "undefined data property at path [list][1].id");
}
