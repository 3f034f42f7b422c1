//! Prefix source trait.

/// Trait for excluded-prefix sources.
///
/// An aggregator holds every source behind this trait; whenever any source
/// signals a change, the aggregator re-reads `prefixes()` from all of them
/// and recomputes the union. A notification is only a hint that something
/// changed, it never carries the new value.
pub trait PrefixSource: Send + Sync {
    /// Current prefixes from this source, in source emission order.
    ///
    /// Pure read with no side effects; safe to call concurrently with the
    /// source's own background updates.
    fn prefixes(&self) -> Vec<String>;
}
