//! Per-client intermediate-result namespace (spec.md §4.8).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::result::ResultValue;

/// A name → result mapping owned by a single client session. `put` is the
/// only mutation point and is serialized by a mutex, since a batch's select
/// workers may install results concurrently.
pub struct ClientContext {
    handles: Mutex<HashMap<String, ResultValue>>,
}

impl ClientContext {
    pub fn new(default_capacity: usize) -> Self {
        ClientContext {
            handles: Mutex::new(HashMap::with_capacity(default_capacity)),
        }
    }

    /// Returns a clone of the bound result, if any.
    pub fn get(&self, name: &str) -> Option<ResultValue> {
        self.handles.lock().get(name).cloned()
    }

    /// Binds `name` to `value`, replacing (and freeing) any prior binding.
    pub fn put(&self, name: impl Into<String>, value: ResultValue) {
        self.handles.lock().insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
