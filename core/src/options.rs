//! Construction options for models.
//!
//! [`StoreOptions`] describes what a model holds (data, schema, methods,
//! computed properties, watchers); [`ModelOptions`] describes how it is
//! enforced. Both are plain builders consumed by [`crate::model`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use vigil_types::Schema;

use crate::environment::Environment;
use crate::errors::ModelError;
use crate::model::Model;
use crate::reactive::FlushMode;

pub type MethodFn = Rc<dyn Fn(&Model, &[Value]) -> Result<Value, ModelError>>;
pub type AsyncMethodFn =
    Rc<dyn Fn(Model, Vec<Value>) -> LocalBoxFuture<'static, Result<Value, ModelError>>>;
pub type GetterFn = Rc<dyn Fn(&Model) -> Value>;
pub type SetterFn = Rc<dyn Fn(&Model, Value) -> Result<(), ModelError>>;
pub type WatchFn = Rc<dyn Fn(&Model, Option<&Value>) -> Result<(), ModelError>>;

/// A mutation entry point.
#[derive(Clone)]
pub enum Method {
    Sync(MethodFn),
    /// Runs to completion across await points; its changes may land late.
    Async(AsyncMethodFn),
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Sync(_) => f.write_str("Method::Sync"),
            Method::Async(_) => f.write_str("Method::Async"),
        }
    }
}

/// A derived property: getter only, or getter plus setter.
#[derive(Clone)]
pub enum Computed {
    Getter(GetterFn),
    Accessor { get: GetterFn, set: SetterFn },
}

impl Computed {
    #[must_use]
    pub fn getter(&self) -> &GetterFn {
        match self {
            Computed::Getter(get) | Computed::Accessor { get, .. } => get,
        }
    }

    #[must_use]
    pub fn setter(&self) -> Option<&SetterFn> {
        match self {
            Computed::Getter(_) => None,
            Computed::Accessor { set, .. } => Some(set),
        }
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Getter(_) => f.write_str("Computed::Getter"),
            Computed::Accessor { .. } => f.write_str("Computed::Accessor"),
        }
    }
}

/// What a model holds.
///
/// `data` starts out absent; constructing a model without it fails.
#[derive(Clone, Default)]
pub struct StoreOptions {
    pub name: Option<String>,
    pub data: Option<Value>,
    pub schema: Option<Schema>,
    pub methods: BTreeMap<String, Method>,
    pub computed: BTreeMap<String, Computed>,
    pub watch: Vec<(String, WatchFn)>,
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("schema", &self.schema.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field(
                "watch",
                &self.watch.iter().map(|(path, _)| path).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl StoreOptions {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&Model, &[Value]) -> Result<Value, ModelError> + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Method::Sync(Rc::new(method)));
        self
    }

    pub fn async_method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(Model, Vec<Value>) -> LocalBoxFuture<'static, Result<Value, ModelError>>
        + 'static,
    ) -> Self {
        self.methods
            .insert(name.into(), Method::Async(Rc::new(method)));
        self
    }

    pub fn getter(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Model) -> Value + 'static,
    ) -> Self {
        self.computed.insert(name.into(), Computed::Getter(Rc::new(get)));
        self
    }

    pub fn accessor(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Model) -> Value + 'static,
        set: impl Fn(&Model, Value) -> Result<(), ModelError> + 'static,
    ) -> Self {
        self.computed.insert(
            name.into(),
            Computed::Accessor {
                get: Rc::new(get),
                set: Rc::new(set),
            },
        );
        self
    }

    pub fn watch(
        mut self,
        path: impl Into<String>,
        callback: impl Fn(&Model, Option<&Value>) -> Result<(), ModelError> + 'static,
    ) -> Self {
        self.watch.push((path.into(), Rc::new(callback)));
        self
    }
}

/// How a model is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    /// Install the mutation guard (outside production).
    pub immutable: bool,
    pub flush: FlushMode,
    /// Pin the environment instead of reading the process-wide flag.
    pub environment: Option<Environment>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            immutable: true,
            flush: FlushMode::default(),
            environment: None,
        }
    }
}

impl ModelOptions {
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn flush(mut self, flush: FlushMode) -> Self {
        self.flush = flush;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Environment this construction runs under.
    #[must_use]
    pub fn resolved_environment(&self) -> Environment {
        self.environment.unwrap_or_else(Environment::current)
    }
}
