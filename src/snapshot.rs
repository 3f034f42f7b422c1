//! Synchronized storage for a source's current prefix list.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Atomically replaceable snapshot of a prefix list.
///
/// The watch task is the only writer; the aggregator (and tests) read
/// concurrently. Each [`store`](Self::store) swaps in a whole new immutable
/// list, so a reader can never observe a mix of two writes.
///
/// # Examples
///
/// ```rust
/// use excluded_prefixes::snapshot::PrefixSnapshot;
///
/// let snapshot = PrefixSnapshot::new();
/// assert!(snapshot.load().is_empty());
///
/// snapshot.store(vec!["10.0.0.0/16".to_string()]);
/// assert_eq!(snapshot.load(), vec!["10.0.0.0/16".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct PrefixSnapshot {
    current: ArcSwap<Vec<String>>,
}

impl PrefixSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::new(Arc::new(Vec::new())),
        }
    }

    /// Atomically replace the current prefix list.
    pub fn store(&self, prefixes: Vec<String>) {
        self.current.store(Arc::new(prefixes));
    }

    /// Atomically read the current prefix list.
    ///
    /// Lock-free; returns an owned copy of whichever fully written snapshot
    /// is current at the moment of the call.
    pub fn load(&self) -> Vec<String> {
        self.current.load().as_ref().clone()
    }
}
