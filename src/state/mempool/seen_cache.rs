//! A bounded recency set of transaction ids.
//!
//! The mempool keeps two of these: the fingerprint cache of recently seen
//! transactions, and the set of transactions it recently evicted or
//! rejected. Both are optimizations with identical shape — a key's absence
//! never implies the transaction is new, and its presence never implies the
//! transaction is resident.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::protocol::transaction::TxId;

/// Bounded set of transaction ids with drop-oldest behavior. Capacity zero
/// disables the set entirely: pushes report "new", lookups report "absent".
pub(super) struct SeenTxCache {
    entries: Option<LruCache<TxId, ()>>,
}

impl SeenTxCache {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Insert an id, dropping the oldest entry when full. Returns whether
    /// the id was newly added; re-inserting an existing id refreshes its
    /// recency and returns false.
    pub(super) fn push(&mut self, id: TxId) -> bool {
        match &mut self.entries {
            Some(entries) => entries.put(id, ()).is_none(),
            None => true,
        }
    }

    pub(super) fn contains(&self, id: &TxId) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.contains(id))
    }

    pub(super) fn remove(&mut self, id: &TxId) {
        if let Some(entries) = &mut self.entries {
            entries.pop(id);
        }
    }

    pub(super) fn clear(&mut self) {
        if let Some(entries) = &mut self.entries {
            entries.clear();
        }
    }
}
