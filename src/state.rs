use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Process-wide holder of the most recent bypass clearance
///
/// A single lock-free slot: readers take a snapshot of the current value and
/// writers replace it atomically, so a reader never observes a half-written
/// credential. Concurrent refreshes race benignly, the last writer wins.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct ClearanceStore {
    slot: Arc<ArcSwapOption<String>>,
}

impl ClearanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Create a store seeded with a known clearance
    pub fn with_value(value: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(value);
        store
    }

    /// Snapshot of the current clearance
    pub fn get(&self) -> Option<Arc<String>> {
        self.slot.load_full()
    }

    /// Replace the current clearance
    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        tracing::debug!(clearance = %redact(&value), "Storing new clearance");
        self.slot.store(Some(Arc::new(value)));
    }

    pub fn is_present(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl Default for ClearanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// First ten characters of a credential, for logs
pub fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(10).collect();
    format!("{}...", prefix)
}
