//! Mutation guard.
//!
//! Every mutation entry point of a model (methods and computed setters) is
//! wrapped so that calling it first adds one credit to a per-model counter.
//! A watcher on every schema-derived path spends one credit per change
//! notification. A notification that finds no credit means the data changed
//! without going through an entry point, which is an error.
//!
//! # Credits
//!
//! Notifications may land after the entry point has returned (deferred
//! flushes, async methods awaiting between changes), and several guarded calls
//! may be in flight at once. Credits are added at call time and spent at
//! notification time, so overlapping calls each keep their own credit.
//!
//! A guarded call whose change never lands keeps its credit forever, leaving
//! one unguarded change undetected later.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;

use crate::errors::ModelError;
use crate::model::Model;
use crate::options::{Method, SetterFn};
use crate::reactive::{WatchCallback, WatchRegistry};

/// Outstanding guarded-mutation credits for one model.
#[derive(Debug, Default)]
pub struct MutationGuard {
    mutex: Cell<i64>,
}

impl MutationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current credit count.
    #[must_use]
    pub fn count(&self) -> i64 {
        self.mutex.get()
    }

    /// Open one guarded mutation.
    pub fn enter(&self) {
        let count = self.mutex.get() + 1;
        self.mutex.set(count);
        tracing::trace!(mutex = count, "guarded mutation entered");
    }

    /// Spend one credit for a change observed at `path`.
    pub fn settle(&self, path: &str) -> Result<(), ModelError> {
        let count = self.mutex.get();
        match count {
            0 => {
                tracing::warn!(path, "unguarded mutation detected");
                Err(ModelError::Immutable {
                    path: path.to_string(),
                })
            }
            n if n < 0 => Err(ModelError::MutexCorrupted { count: n }),
            n => {
                self.mutex.set(n - 1);
                tracing::trace!(path, mutex = n - 1, "guarded change settled");
                Ok(())
            }
        }
    }

    /// Wrap a method so that calling it opens a guarded mutation.
    ///
    /// Arguments, receiver, and return value pass through untouched. For async
    /// methods the credit is added when the method is called, before its
    /// future is first polled.
    #[must_use]
    pub fn guard_method(self: &Rc<Self>, method: Method) -> Method {
        let guard = Rc::clone(self);
        match method {
            Method::Sync(inner) => Method::Sync(Rc::new(move |model: &Model, args: &[Value]| {
                guard.enter();
                inner(model, args)
            })),
            Method::Async(inner) => Method::Async(Rc::new(move |model: Model, args: Vec<Value>| {
                guard.enter();
                inner(model, args)
            })),
        }
    }

    #[must_use]
    pub fn guard_setter(self: &Rc<Self>, setter: SetterFn) -> SetterFn {
        let guard = Rc::clone(self);
        Rc::new(move |model: &Model, value: Value| {
            guard.enter();
            setter(model, value)
        })
    }

    /// Register a settling watcher on each of `paths`.
    pub fn install(self: &Rc<Self>, registry: &impl WatchRegistry, paths: &[String]) {
        for path in paths {
            let guard = Rc::clone(self);
            let watched = path.clone();
            let callback: WatchCallback =
                Rc::new(move |_: Option<&Value>| guard.settle(&watched));
            registry.observe(path, callback);
        }
    }
}
