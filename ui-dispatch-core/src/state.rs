//! Shared state store addressed by dotted paths
//!
//! The store holds a single nested JSON object. Every component of the
//! interpreter reads and writes through it; nothing else is shared.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::value::{lookup_in_map, Map, Value};

/// A point-in-time view of the whole state.
///
/// Snapshots are immutable: later writes produce a new root instead of
/// touching containers a snapshot still references.
pub type Snapshot = Arc<Map<String, Value>>;

/// Key/value namespace with dotted-path reads and writes.
///
/// Cloning a `StateStore` yields another handle to the same state, so the
/// renderer, dispatcher and fetch queue can each hold one.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use ui_dispatch_core::StateStore;
///
/// let store = StateStore::new();
/// store.set("user.name", json!("Ann"));
/// assert_eq!(store.get("user"), Some(json!({"name": "Ann"})));
///
/// store.set("user.name", json!(null));
/// assert!(!store.has("user.name"));
/// ```
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Inner>,
}

struct Inner {
    root: RwLock<Snapshot>,
    changes: watch::Sender<u64>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("version", &self.version())
            .field("state", &*self.snapshot())
            .finish()
    }
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(Arc::new(Map::new())),
                changes,
            }),
        }
    }

    /// Read the value at `path`, if present.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = self.inner.root.read();
        lookup_in_map(&root, path).cloned()
    }

    /// Whether a value is present at `path`.
    pub fn has(&self, path: &str) -> bool {
        let root = self.inner.root.read();
        lookup_in_map(&root, path).is_some()
    }

    /// Write `value` at `path`.
    ///
    /// A `null` value removes the entry instead of storing it. Missing or
    /// non-object intermediate segments are replaced with fresh objects.
    pub fn set(&self, path: &str, value: Value) {
        if value.is_null() {
            self.remove(path);
            return;
        }

        {
            let mut root = self.inner.root.write();
            write_path(Arc::make_mut(&mut root), path, value);
        }
        tracing::trace!(path, "state set");
        self.notify();
    }

    /// Remove the entry at `path`, returning whether anything was removed.
    ///
    /// Subscribers are notified either way so that a write of `null` behaves
    /// like any other write.
    pub fn remove(&self, path: &str) -> bool {
        let removed = {
            let mut root = self.inner.root.write();
            if lookup_in_map(&root, path).is_some() {
                remove_path(Arc::make_mut(&mut root), path).is_some()
            } else {
                false
            }
        };
        tracing::trace!(path, removed, "state remove");
        self.notify();
        removed
    }

    /// Current state as an immutable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.root.read().clone()
    }

    /// Number of writes applied so far.
    pub fn version(&self) -> u64 {
        *self.inner.changes.borrow()
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver observes the write counter; hosts re-render whenever it
    /// reports a change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|version| *version += 1);
    }
}

fn write_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                write_path(child, rest, value);
            }
        }
    }
}

fn remove_path(map: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => map.remove(path),
        Some((head, rest)) => match map.get_mut(head) {
            Some(Value::Object(child)) => remove_path(child, rest),
            _ => None,
        },
    }
}
