//! Process-wide shared runtime registry
//!
//! Generated classes bootstrap themselves against a scripting runtime that
//! is created once per application scope and reused by every class loaded
//! afterwards. This module models that application scope as an explicit,
//! injectable service with lazy-init-once-and-cache semantics instead of an
//! ambient global map lookup: the first caller of a key runs the
//! initializer under the registry lock, every later caller gets the cached
//! instance.
//!
//! The translator holds a registry and uses it to build its bootstrap
//! preamble once per runtime key; an embedding host can share the same
//! registry to key other application-scoped services.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry key under which generated code stores the shared Ruby runtime
pub const RUBY_RUNTIME_KEY: &str = "__RubyRuntime";

/// Keyed lazy-init-once cache of shared services
#[derive(Default)]
pub struct RuntimeRegistry {
    slots: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the instance registered under `key`, initializing it with
    /// `init` if absent. The initializer runs at most once per key for the
    /// lifetime of the registry, even under concurrent callers.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already bound to a value of a different type.
    pub fn get_or_init<T, F>(&self, key: &str, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let mut slots = self.lock();
        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(init()));
        Arc::clone(slot)
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("registry key '{key}' bound to a different type"))
    }

    /// Fetch the instance registered under `key`, if any.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let slots = self.lock();
        slots.get(key).and_then(|slot| Arc::clone(slot).downcast::<T>().ok())
    }

    /// Whether `key` has been initialized.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn Any + Send + Sync>>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.lock().keys().cloned().collect();
        f.debug_struct("RuntimeRegistry").field("keys", &keys).finish()
    }
}
