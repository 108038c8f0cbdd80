//! Model factory scenarios

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use vigil_core::predicates::{self, number, string};
use vigil_core::{MODEL_MARKER, ModelError, Schema, StoreOptions, ValidationError, is_model, model};

use crate::common::{dev, prod, profile_data, profile_schema, publishers_store};

fn user_store() -> StoreOptions {
    StoreOptions::new(json!({"id": 1}))
        .name("user")
        .schema(Schema::object([("id", number())]))
        .method("setId", |m, args| {
            m.set("id", args.first().cloned().unwrap_or(Value::Null))?;
            Ok(Value::Null)
        })
}

#[test]
fn external_string_assignment_is_immutable_violation() {
    let user = model(user_store(), dev()).unwrap();
    let err = user.set("id", json!("1")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "store is immutable! Updates must happen within a method or computed setter (changed: id)"
    );
}

#[test]
fn method_assignment_is_type_checked() {
    let user = model(user_store(), dev()).unwrap();
    let err = user.call("setId", &[json!("x")]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "check failed for data property at path [user].id. Got: \"x\""
    );
}

#[test]
fn valid_publishers_never_raise() {
    let shop = model(publishers_store(), dev()).unwrap();
    shop.call("addPublisher", &[json!({"id": "p3", "name": "Orbit"})])
        .unwrap();
    assert_eq!(shop.get("publishers.2.id"), Some(json!("p3")));
}

#[test]
fn publisher_missing_id_is_reported_by_index() {
    let shop = model(publishers_store(), dev()).unwrap();
    let err = shop
        .call("addPublisher", &[json!({"name": "Orbit"})])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "undefined data property at path [store].publishers[2].id"
    );
}

#[test]
fn whole_array_replacement_is_revalidated() {
    let shop = model(publishers_store(), dev()).unwrap();
    let err = shop
        .call("replacePublishers", &[json!({"id": "p1"})])
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::ExpectedArray { .. })
    ));
}

#[test]
fn construction_validates_data() {
    let mut data = profile_data();
    data["tags"] = json!(["ok", 3]);
    let store = StoreOptions::new(data).name("user").schema(profile_schema());
    let err = model(store, dev()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "check failed for data property at path [user].tags[1]. Got: 3"
    );
}

#[test]
fn production_accepts_anything() {
    let store = StoreOptions::new(json!({"id": "x"}))
        .name("user")
        .schema(Schema::object([("id", number())]));
    let user = model(store, prod()).unwrap();
    assert!(user.watch_paths().is_empty());
    user.set("id", json!([])).unwrap();
}

#[test]
fn precondition_errors() {
    assert_eq!(
        model(StoreOptions::default(), dev()).unwrap_err(),
        ModelError::MissingData
    );
    let wrapped = StoreOptions::new(json!({MODEL_MARKER: "user"}));
    assert_eq!(
        model(wrapped, dev()).unwrap_err().to_string(),
        "attempting to create a model from a model"
    );
}

#[test]
fn models_embed_by_handle() {
    let author = model(user_store().name("author"), dev()).unwrap();
    assert!(is_model(&author.handle()));

    let post_schema = Schema::object([
        ("title", Schema::from(string())),
        ("author", Schema::from(predicates::model("author"))),
    ]);
    let post = StoreOptions::new(json!({"title": "Hi", "author": author.handle()}))
        .name("post")
        .schema(post_schema)
        .method("setAuthor", |m, args| {
            m.set("author", args[0].clone())?;
            Ok(Value::Null)
        });
    let post = model(post, dev()).unwrap();

    let stranger = model(user_store(), dev()).unwrap();
    let err = post.call("setAuthor", &[stranger.handle()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "check failed for data property at path [post].author. Got: {{\"{MODEL_MARKER}\":\"user\"}}"
        )
    );
}

#[test]
fn computed_properties() {
    let store = StoreOptions::new(json!({"first": "Ada", "last": "Lovelace"}))
        .name("person")
        .schema(Schema::object([("first", string()), ("last", string())]))
        .getter("full", |m| {
            m.with_data(|d| {
                let first = d["first"].as_str().unwrap_or_default();
                let last = d["last"].as_str().unwrap_or_default();
                json!(format!("{first} {last}"))
            })
        })
        .accessor(
            "firstName",
            |m| m.get("first").unwrap_or(Value::Null),
            |m, value| m.set("first", value),
        );
    let person = model(store, dev()).unwrap();
    assert_eq!(person.computed("full").unwrap(), json!("Ada Lovelace"));

    person.set_computed("firstName", json!("Augusta")).unwrap();
    assert_eq!(person.computed("full").unwrap(), json!("Augusta Lovelace"));
    assert_eq!(person.mutex(), Some(0));

    let err = person.set_computed("firstName", json!(1)).unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
    assert_eq!(
        person.set_computed("full", json!("x")),
        Err(ModelError::ReadOnlyComputed("full".to_string()))
    );
}

#[test]
fn watch_option_callbacks_receive_new_values() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let store = user_store().watch("id", move |m, value| {
        sink.borrow_mut().push((m.name().to_string(), value.cloned()));
        Ok(())
    });
    let user = model(store, dev()).unwrap();
    user.call("setId", &[json!(2)]).unwrap();
    // Same value again: no notification, so the credit is never spent.
    user.call("setId", &[json!(2)]).unwrap();
    assert_eq!(user.mutex(), Some(1));
    assert_eq!(*seen.borrow(), vec![("user".to_string(), Some(json!(2)))]);
}

#[test]
fn watch_callback_errors_propagate() {
    let store = user_store().watch("id", |_, value| {
        if value == Some(&json!(13)) {
            Err(ModelError::custom("unlucky"))
        } else {
            Ok(())
        }
    });
    let user = model(store, dev()).unwrap();
    assert_eq!(
        user.call("setId", &[json!(13)]),
        Err(ModelError::custom("unlucky"))
    );
    assert_eq!(user.mutex(), Some(0));
    assert_eq!(user.get("id"), Some(json!(13)));
}

#[test]
fn anonymous_models_label_paths() {
    let store = StoreOptions::new(json!({"n": 1}))
        .schema(Schema::object([("n", number())]))
        .method("set", |m, args| {
            m.set("n", args[0].clone())?;
            Ok(Value::Null)
        });
    let m = model(store, dev()).unwrap();
    let err = m.call("set", &[json!(null)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "check failed for data property at path [anonymous].n. Got: null"
    );
}
