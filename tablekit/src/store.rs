//! View-state storage backend trait.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Backend trait for persisted view state.
///
/// A synchronous, string-keyed, string-valued store scoped to wherever
/// the host runs (for a browser host, the origin's local storage).
/// Implementations must never block on I/O for longer than a user
/// interaction tolerates; reads and writes are not retried.
pub trait ViewStateStore: Send + Sync {
    /// Get the value for a key, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Set the value for a key.
    fn set(&self, key: &str, value: &str);
}

/// In-memory store.
///
/// Used by tests as a substitutable double, and by hosts that want
/// session-only view state without wiring a real backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ViewStateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok().and_then(|g| g.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard.insert(key.to_string(), value.to_string());
        }
    }
}
