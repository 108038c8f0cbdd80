//! Mutation guard behavior through constructed models

use futures_util::FutureExt;
use futures_util::future::join;
use serde_json::{Value, json};
use vigil_core::predicates::number;
use vigil_core::{FlushMode, Model, ModelError, Schema, StoreOptions, model};

use crate::common::{dev, prod, publishers_store};

fn counter_store() -> StoreOptions {
    StoreOptions::new(json!({"count": 0, "label": "c"}))
        .name("counter")
        .schema(Schema::object([("count", number())]))
        .method("increment", |m, _| {
            let next = m.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
            m.set("count", json!(next))?;
            Ok(json!(next))
        })
        .method("twice", |m, _| {
            m.update("count", |v| *v = json!(v.as_i64().unwrap_or(0) + 1))?;
            m.update("count", |v| *v = json!(v.as_i64().unwrap_or(0) + 1))?;
            Ok(Value::Null)
        })
        .async_method("incrementLater", |m: Model, _: Vec<Value>| {
            async move {
                tokio::task::yield_now().await;
                let next = m.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
                m.set("count", json!(next))?;
                Ok::<_, ModelError>(json!(next))
            }
            .boxed_local()
        })
}

#[test]
fn guarded_method_leaves_counter_at_zero() {
    let counter = model(counter_store(), dev()).unwrap();
    assert_eq!(counter.call("increment", &[]).unwrap(), json!(1));
    assert_eq!(counter.mutex(), Some(0));
    assert_eq!(counter.get("count"), Some(json!(1)));
}

#[test]
fn direct_assignment_is_rejected() {
    let counter = model(counter_store(), dev()).unwrap();
    let err = counter.set("count", json!(5)).unwrap_err();
    assert!(err.is_guard_violation());
    assert_eq!(
        err,
        ModelError::Immutable {
            path: "count".to_string()
        }
    );
}

#[test]
fn failing_user_watcher_still_spends_the_credit() {
    let store = counter_store()
        .method("setCount", |m, args| {
            m.set("count", args[0].clone())?;
            Ok(Value::Null)
        })
        .watch("count", |_, value| match value {
            Some(Value::String(_)) => Err(ModelError::custom("count must stay numeric")),
            _ => Ok(()),
        });
    let counter = model(store, dev()).unwrap();

    let err = counter.call("setCount", &[json!("x")]).unwrap_err();
    assert_eq!(err, ModelError::custom("count must stay numeric"));
    assert_eq!(counter.mutex(), Some(0));

    let err = counter.set("count", json!(5)).unwrap_err();
    assert_eq!(
        err,
        ModelError::Immutable {
            path: "count".to_string()
        }
    );
}

#[test]
fn unwatched_fields_are_free() {
    let counter = model(counter_store(), dev()).unwrap();
    counter.set("label", json!("renamed")).unwrap();
    counter.set("extra", json!(true)).unwrap();
    assert_eq!(counter.mutex(), Some(0));
}

#[test]
fn writing_the_same_value_is_not_a_change() {
    let counter = model(counter_store(), dev()).unwrap();
    counter.set("count", json!(0)).unwrap();
}

#[test]
fn one_call_one_credit() {
    // One guarded call buys one change notification.
    let counter = model(counter_store(), dev()).unwrap();
    let err = counter.call("twice", &[]).unwrap_err();
    assert_eq!(
        err,
        ModelError::Immutable {
            path: "count".to_string()
        }
    );
}

#[test]
fn deferred_flush_batches_credits() {
    let counter = model(counter_store(), dev().flush(FlushMode::Deferred)).unwrap();
    counter.call("increment", &[]).unwrap();
    counter.call("increment", &[]).unwrap();
    assert_eq!(counter.mutex(), Some(2));
    assert_eq!(counter.pending_changes(), 2);
    counter.flush().unwrap();
    assert_eq!(counter.mutex(), Some(0));
    assert_eq!(counter.pending_changes(), 0);
}

#[test]
fn deferred_direct_assignment_fails_at_flush() {
    let counter = model(counter_store(), dev().flush(FlushMode::Deferred)).unwrap();
    counter.set("count", json!(3)).unwrap();
    assert!(counter.flush().unwrap_err().is_guard_violation());
}

#[test]
fn each_queued_change_needs_its_own_credit() {
    let counter = model(counter_store(), dev().flush(FlushMode::Deferred)).unwrap();
    counter.call("increment", &[]).unwrap();
    counter.set("count", json!(10)).unwrap();
    assert_eq!(counter.mutex(), Some(1));
    assert!(counter.flush().unwrap_err().is_guard_violation());
    assert_eq!(counter.mutex(), Some(0));
}

#[tokio::test]
async fn overlapping_async_calls_never_go_negative() {
    let counter = model(counter_store(), dev()).unwrap();
    let first = counter.call_async("incrementLater", Vec::new());
    let second = counter.call_async("incrementLater", Vec::new());
    assert_eq!(counter.mutex(), Some(2));

    let (a, b) = join(first, second).await;
    assert_eq!(a.unwrap(), json!(1));
    assert_eq!(b.unwrap(), json!(2));
    assert_eq!(counter.mutex(), Some(0));
}

#[tokio::test]
async fn sync_methods_work_through_call_async() {
    let counter = model(counter_store(), dev()).unwrap();
    let result = counter.call_async("increment", Vec::new()).await.unwrap();
    assert_eq!(result, json!(1));
    assert_eq!(counter.mutex(), Some(0));
}

#[test]
fn immutable_false_disables_the_guard() {
    let counter = model(counter_store(), dev().immutable(false)).unwrap();
    counter.set("count", json!(9)).unwrap();
    assert_eq!(counter.mutex(), None);
    assert!(!counter.is_guarded());
}

#[test]
fn production_disables_the_guard() {
    let counter = model(counter_store(), prod()).unwrap();
    counter.set("count", json!("not even a number")).unwrap();
    assert_eq!(counter.mutex(), None);
}

#[test]
fn element_push_outside_methods_is_rejected() {
    let shop = model(publishers_store(), dev()).unwrap();
    let err = shop
        .push("publishers", json!({"id": "p3", "name": "Orbit"}))
        .unwrap_err();
    assert!(err.is_guard_violation());
}
