//! Model factory and instance handle.
//!
//! [`model`] composes the rest of the crate into one constructed instance:
//!
//! 1. Check preconditions (data present, data not already a model handle).
//! 2. Outside production, derive watch paths from the schema.
//! 3. If the guard applies, wrap every method and computed setter.
//! 4. Construct the [`ReactiveObject`] holding the data.
//! 5. Register user watchers, then guard watchers, then validators.
//! 6. Outside production, validate the whole tree once before returning.
//!
//! Registration order matters: for one change at one path the guard spends
//! its credit before the changed subtree is re-validated, so a guarded call
//! that writes a bad value reports the type error, not a guard violation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use serde_json::{Value, json};
use vigil_types::{ANONYMOUS_MODEL, DataPath, MODEL_MARKER, model_name};

use crate::environment::Environment;
use crate::errors::ModelError;
use crate::guard::MutationGuard;
use crate::options::{Computed, Method, ModelOptions, StoreOptions, WatchFn};
use crate::reactive::{FlushMode, ReactiveObject, WatchCallback, WatchRegistry};
use crate::validate::{deep_type_check, validate};
use crate::watch_paths::watch_properties;

struct ModelInner {
    name: String,
    reactive: ReactiveObject,
    methods: BTreeMap<String, Method>,
    computed: BTreeMap<String, Computed>,
    guard: Option<Rc<MutationGuard>>,
    watch_paths: Vec<String>,
    environment: Environment,
}

/// A constructed model. Clones share the same instance.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("data", &self.inner.reactive.snapshot())
            .field("methods", &self.inner.methods.keys().collect::<Vec<_>>())
            .field("computed", &self.inner.computed.keys().collect::<Vec<_>>())
            .field("mutex", &self.mutex())
            .field("environment", &self.inner.environment)
            .finish_non_exhaustive()
    }
}

/// Construct a model from `store`, enforced according to `options`.
pub fn model(store: StoreOptions, options: ModelOptions) -> Result<Model, ModelError> {
    let StoreOptions {
        name,
        data,
        schema,
        methods,
        computed,
        watch,
    } = store;

    let data = data.ok_or(ModelError::MissingData)?;
    if model_name(&data).is_some() {
        return Err(ModelError::ModelFromModel);
    }
    let name = name.unwrap_or_else(|| ANONYMOUS_MODEL.to_string());
    let environment = options.resolved_environment();
    let checked = !environment.is_production();

    let watch_paths = match &schema {
        Some(schema) if checked => watch_properties(schema),
        _ => Vec::new(),
    };

    let guard = (options.immutable && checked).then(|| Rc::new(MutationGuard::new()));
    let (methods, computed) = match &guard {
        Some(guard) => guard_members(guard, methods, computed),
        None => (methods, computed),
    };

    let inner = Rc::new(ModelInner {
        name,
        reactive: ReactiveObject::new(data, options.flush),
        methods,
        computed,
        guard,
        watch_paths,
        environment,
    });

    for (path, callback) in watch {
        inner
            .reactive
            .observe(&path, user_callback(Rc::downgrade(&inner), callback));
    }

    if let Some(schema) = schema.as_ref().filter(|_| checked) {
        inner
            .reactive
            .with(|data| validate(data, schema, &inner.name))?;
        if let Some(guard) = &inner.guard {
            guard.install(&inner.reactive, &inner.watch_paths);
        }
        for path in &inner.watch_paths {
            let sub = schema.lookup(path).cloned();
            let at = DataPath::root(&inner.name).join_dotted(path);
            let callback: WatchCallback = Rc::new(move |value: Option<&Value>| {
                deep_type_check(value, sub.as_ref(), &at).map_err(ModelError::from)
            });
            inner.reactive.observe(path, callback);
        }
    }

    tracing::debug!(
        name = %inner.name,
        watch_paths = inner.watch_paths.len(),
        guarded = inner.guard.is_some(),
        environment = environment.as_str(),
        "model constructed"
    );
    Ok(Model { inner })
}

fn guard_members(
    guard: &Rc<MutationGuard>,
    methods: BTreeMap<String, Method>,
    computed: BTreeMap<String, Computed>,
) -> (BTreeMap<String, Method>, BTreeMap<String, Computed>) {
    let methods = methods
        .into_iter()
        .map(|(name, method)| (name, guard.guard_method(method)))
        .collect();
    let computed = computed
        .into_iter()
        .map(|(name, entry)| {
            let entry = match entry {
                Computed::Accessor { get, set } => Computed::Accessor {
                    get,
                    set: guard.guard_setter(set),
                },
                getter @ Computed::Getter(_) => getter,
            };
            (name, entry)
        })
        .collect();
    (methods, computed)
}

fn user_callback(inner: Weak<ModelInner>, callback: WatchFn) -> WatchCallback {
    Rc::new(move |value: Option<&Value>| -> Result<(), ModelError> {
        let inner = inner.upgrade().ok_or(ModelError::Detached)?;
        callback(&Model { inner }, value)
    })
}

/// Whether `value` is the handle of a constructed model.
#[must_use]
pub fn is_model(value: &Value) -> bool {
    model_name(value).is_some()
}

impl Model {
    /// Same as [`model`].
    pub fn new(store: StoreOptions, options: ModelOptions) -> Result<Self, ModelError> {
        model(store, options)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Clone of the whole data tree.
    #[must_use]
    pub fn data(&self) -> Value {
        self.inner.reactive.snapshot()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        self.inner.reactive.get(path)
    }

    /// Borrow the data tree. `f` must not mutate this model.
    pub fn with_data<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.inner.reactive.with(f)
    }

    /// Assign at a dot path. Not guarded by itself: outside a method or
    /// computed setter this trips the guard on watched paths.
    pub fn set(&self, path: &str, value: Value) -> Result<(), ModelError> {
        self.inner.reactive.set(path, value)
    }

    pub fn push(&self, path: &str, value: Value) -> Result<(), ModelError> {
        self.inner.reactive.push(path, value)
    }

    pub fn remove(&self, path: &str) -> Result<Option<Value>, ModelError> {
        self.inner.reactive.remove(path)
    }

    pub fn update(&self, path: &str, f: impl FnOnce(&mut Value)) -> Result<(), ModelError> {
        self.inner.reactive.update(path, f)
    }

    /// Call a synchronous method.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ModelError> {
        match self.inner.methods.get(name) {
            Some(Method::Sync(method)) => {
                let method = Rc::clone(method);
                method(self, args)
            }
            Some(Method::Async(_)) => Err(ModelError::AsyncMethod(name.to_string())),
            None => Err(ModelError::UnknownMethod(name.to_string())),
        }
    }

    /// Call any method, returning its completion as a future.
    ///
    /// The guard credit (if any) is added here, before the future is polled.
    /// Synchronous methods run to completion immediately.
    pub fn call_async(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> LocalBoxFuture<'static, Result<Value, ModelError>> {
        match self.inner.methods.get(name) {
            Some(Method::Async(method)) => {
                let method = Rc::clone(method);
                method(self.clone(), args)
            }
            Some(Method::Sync(method)) => {
                let method = Rc::clone(method);
                future::ready(method(self, &args)).boxed_local()
            }
            None => future::ready(Err(ModelError::UnknownMethod(name.to_string()))).boxed_local(),
        }
    }

    /// Evaluate a computed property.
    pub fn computed(&self, name: &str) -> Result<Value, ModelError> {
        let entry = self
            .inner
            .computed
            .get(name)
            .ok_or_else(|| ModelError::UnknownComputed(name.to_string()))?;
        let get = Rc::clone(entry.getter());
        Ok(get(self))
    }

    /// Assign a computed property through its setter.
    pub fn set_computed(&self, name: &str, value: Value) -> Result<(), ModelError> {
        let entry = self
            .inner
            .computed
            .get(name)
            .ok_or_else(|| ModelError::UnknownComputed(name.to_string()))?;
        let set = entry
            .setter()
            .map(Rc::clone)
            .ok_or_else(|| ModelError::ReadOnlyComputed(name.to_string()))?;
        set(self, value)
    }

    /// Watch a path after construction. Runs after every earlier watcher.
    pub fn watch(
        &self,
        path: &str,
        callback: impl Fn(&Model, Option<&Value>) -> Result<(), ModelError> + 'static,
    ) {
        let callback: WatchFn = Rc::new(callback);
        self.inner
            .reactive
            .observe(path, user_callback(Rc::downgrade(&self.inner), callback));
    }

    /// Deliver queued change notifications (deferred flush mode).
    pub fn flush(&self) -> Result<(), ModelError> {
        self.inner.reactive.flush()
    }

    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.inner.reactive.pending_changes()
    }

    #[must_use]
    pub fn flush_mode(&self) -> FlushMode {
        self.inner.reactive.mode()
    }

    /// Outstanding guarded-mutation credits; `None` without a guard.
    #[must_use]
    pub fn mutex(&self) -> Option<i64> {
        self.inner.guard.as_ref().map(|guard| guard.count())
    }

    #[must_use]
    pub fn is_guarded(&self) -> bool {
        self.inner.guard.is_some()
    }

    /// Paths watched for guarding and re-validation.
    #[must_use]
    pub fn watch_paths(&self) -> &[String] {
        &self.inner.watch_paths
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.inner.environment
    }

    /// Value standing for this model inside other models' data.
    #[must_use]
    pub fn handle(&self) -> Value {
        json!({ MODEL_MARKER: self.inner.name })
    }

    /// Reactive object backing this model.
    #[must_use]
    pub fn reactive(&self) -> &ReactiveObject {
        &self.inner.reactive
    }
}
