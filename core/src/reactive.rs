//! Minimal reactive object: a data tree with path watchers and change events.
//!
//! This stands in for a host reactive runtime. Models only need two things
//! from it, captured by [`WatchRegistry`]: registering a callback for a
//! dot-joined path, and having that callback run with the new value whenever
//! the value at the path changes.
//!
//! # Change detection
//!
//! Mutations address values by dot path (`profile.name`, `tags.0`). After a
//! mutation, every watched path that is the mutated path, one of its
//! ancestors, or one of its descendants is compared before and after by value.
//! Each differing path queues one [`ChangeEvent`].
//!
//! # Invariants
//!
//! 1. Writing a value equal to the current one queues nothing.
//! 2. Events are delivered in the order they were queued; callbacks for one
//!    event run in registration order.
//! 3. Every callback for an event runs even if an earlier one fails; the
//!    first error is returned once the event is delivered. Events not yet
//!    delivered stay queued for the next [`ReactiveObject::flush`].
//! 4. Mutations made from inside a callback are queued and delivered by the
//!    flush already running, never by a nested one.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ModelError;

/// Callback run with the new value at a watched path (`None` once removed).
pub type WatchCallback = Rc<dyn Fn(Option<&Value>) -> Result<(), ModelError>>;

/// Registration side of a reactive runtime.
pub trait WatchRegistry {
    fn observe(&self, path: &str, callback: WatchCallback);
}

/// A value change at a watched path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub path: String,
    pub value: Option<Value>,
}

/// When queued change events reach their watchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// At the end of every mutation.
    #[default]
    Sync,
    /// Only on an explicit [`ReactiveObject::flush`], batching many mutations.
    Deferred,
}

struct Watcher {
    path: String,
    callback: WatchCallback,
}

pub struct ReactiveObject {
    state: RefCell<Value>,
    watchers: RefCell<Vec<Watcher>>,
    pending: RefCell<VecDeque<ChangeEvent>>,
    flushing: Cell<bool>,
    mode: FlushMode,
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("state", &self.state.borrow())
            .field("watchers", &self.watched_paths())
            .field("pending", &self.pending.borrow().len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl ReactiveObject {
    #[must_use]
    pub fn new(data: Value, mode: FlushMode) -> Self {
        Self {
            state: RefCell::new(data),
            watchers: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            flushing: Cell::new(false),
            mode,
        }
    }

    #[must_use]
    pub fn mode(&self) -> FlushMode {
        self.mode
    }

    /// Clone of the whole data tree.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.state.borrow().clone()
    }

    /// Clone of the value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        value_at(&self.state.borrow(), path).cloned()
    }

    /// Borrow the data tree without cloning it.
    ///
    /// `f` must not mutate this object.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Assign `value` at `path`, adding the key if the parent object lacks it.
    pub fn set(&self, path: &str, value: Value) -> Result<(), ModelError> {
        self.mutate(path, |root| {
            let (parent, last) = parent_mut(root, path)?;
            match parent {
                Value::Object(map) => {
                    map.insert(last.to_string(), value);
                    Ok(())
                }
                Value::Array(items) => {
                    let slot = index_in(items, last, path)?;
                    items[slot] = value;
                    Ok(())
                }
                _ => Err(ModelError::invalid_path(
                    path,
                    "parent is not an object or array",
                )),
            }
        })
    }

    /// Append `value` to the array at `path`.
    pub fn push(&self, path: &str, value: Value) -> Result<(), ModelError> {
        self.mutate(path, |root| match value_at_mut(root, path) {
            Some(Value::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(_) => Err(ModelError::invalid_path(path, "not an array")),
            None => Err(ModelError::invalid_path(path, "no value at path")),
        })
    }

    /// Remove the object key or array element at `path`, returning it.
    pub fn remove(&self, path: &str) -> Result<Option<Value>, ModelError> {
        self.mutate(path, |root| {
            let (parent, last) = parent_mut(root, path)?;
            match parent {
                Value::Object(map) => Ok(map.remove(last)),
                Value::Array(items) => {
                    let slot = index_in(items, last, path)?;
                    Ok(Some(items.remove(slot)))
                }
                _ => Err(ModelError::invalid_path(
                    path,
                    "parent is not an object or array",
                )),
            }
        })
    }

    /// Mutate the value at `path` in place.
    pub fn update(&self, path: &str, f: impl FnOnce(&mut Value)) -> Result<(), ModelError> {
        self.mutate(path, |root| {
            let target = value_at_mut(root, path)
                .ok_or_else(|| ModelError::invalid_path(path, "no value at path"))?;
            f(target);
            Ok(())
        })
    }

    /// Deliver queued change events.
    pub fn flush(&self) -> Result<(), ModelError> {
        if self.flushing.replace(true) {
            return Ok(());
        }
        let result = self.drain();
        self.flushing.set(false);
        result
    }

    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn pending_events(&self) -> Vec<ChangeEvent> {
        self.pending.borrow().iter().cloned().collect()
    }

    /// Distinct watched paths, in first-registration order.
    #[must_use]
    pub fn watched_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for watcher in self.watchers.borrow().iter() {
            if !paths.contains(&watcher.path) {
                paths.push(watcher.path.clone());
            }
        }
        paths
    }

    fn mutate<R>(
        &self,
        path: &str,
        op: impl FnOnce(&mut Value) -> Result<R, ModelError>,
    ) -> Result<R, ModelError> {
        let affected: Vec<String> = self
            .watched_paths()
            .into_iter()
            .filter(|watched| related(watched, path))
            .collect();
        let before: Vec<Option<Value>> = {
            let state = self.state.borrow();
            affected
                .iter()
                .map(|watched| value_at(&state, watched).cloned())
                .collect()
        };

        let result = op(&mut self.state.borrow_mut())?;

        {
            let state = self.state.borrow();
            let mut pending = self.pending.borrow_mut();
            for (watched, old) in affected.into_iter().zip(before) {
                let new = value_at(&state, &watched);
                if new != old.as_ref() {
                    tracing::trace!(path = %watched, changed = path, "queued change event");
                    pending.push_back(ChangeEvent {
                        path: watched,
                        value: new.cloned(),
                    });
                }
            }
        }

        if self.mode == FlushMode::Sync {
            self.flush()?;
        }
        Ok(result)
    }

    fn drain(&self) -> Result<(), ModelError> {
        loop {
            let Some(event) = self.pending.borrow_mut().pop_front() else {
                return Ok(());
            };
            let callbacks: Vec<WatchCallback> = self
                .watchers
                .borrow()
                .iter()
                .filter(|watcher| watcher.path == event.path)
                .map(|watcher| Rc::clone(&watcher.callback))
                .collect();
            tracing::trace!(path = %event.path, watchers = callbacks.len(), "delivering change");
            let mut first_err = None;
            for callback in callbacks {
                if let Err(err) = callback(event.value.as_ref()) {
                    first_err.get_or_insert(err);
                }
            }
            if let Some(err) = first_err {
                return Err(err);
            }
        }
    }
}

impl WatchRegistry for ReactiveObject {
    fn observe(&self, path: &str, callback: WatchCallback) {
        self.watchers.borrow_mut().push(Watcher {
            path: path.to_string(),
            callback,
        });
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|part| !part.is_empty())
}

/// Value at a dot path; numeric segments index arrays. The empty path is the root.
#[must_use]
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, part| match node {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn value_at_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    segments(path).try_fold(root, |node, part| match node {
        Value::Object(map) => map.get_mut(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    })
}

fn parent_mut<'a, 'p>(
    root: &'a mut Value,
    path: &'p str,
) -> Result<(&'a mut Value, &'p str), ModelError> {
    let trimmed = path.trim_matches('.');
    if trimmed.is_empty() {
        return Err(ModelError::invalid_path(path, "empty path"));
    }
    let (parent_path, last) = trimmed.rsplit_once('.').unwrap_or(("", trimmed));
    let parent = value_at_mut(root, parent_path)
        .ok_or_else(|| ModelError::invalid_path(path, "no such parent"))?;
    Ok((parent, last))
}

fn index_in(items: &[Value], segment: &str, path: &str) -> Result<usize, ModelError> {
    let index = segment
        .parse::<usize>()
        .map_err(|_| ModelError::invalid_path(path, "array segment is not an index"))?;
    if index < items.len() {
        Ok(index)
    } else {
        Err(ModelError::invalid_path(path, "index out of bounds"))
    }
}

/// Whether a change at `changed` can alter the value at `watched`.
fn related(watched: &str, changed: &str) -> bool {
    let watched = watched.trim_matches('.');
    let changed = changed.trim_matches('.');
    changed.is_empty()
        || watched == changed
        || is_below(watched, changed)
        || is_below(changed, watched)
}

fn is_below(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.'))
}
