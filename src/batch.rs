//! Per-query batch accumulation counters.

use std::collections::HashMap;

/// Number of batched writes queued per query name since its last batch fired.
///
/// Entries are created by the first queued write and removed when the batch fires, so the
/// map never holds a zero count.
#[derive(Debug, Default)]
pub(crate) struct BatchCounters {
    pending: HashMap<String, usize>,
}

impl BatchCounters {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record one more queued write for `name`.
    ///
    /// Returns the pending count including this write.
    pub(crate) fn increment(&mut self, name: &str) -> usize {
        let count = self.pending.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Whether `name` has reached `batch_size` queued writes.
    #[must_use]
    pub(crate) fn is_full(&self, name: &str, batch_size: usize) -> bool {
        self.pending(name) >= batch_size
    }

    /// Forget the counter for `name`, returning how many writes were pending.
    pub(crate) fn take(&mut self, name: &str) -> usize {
        self.pending.remove(name).unwrap_or(0)
    }

    /// Pending count for `name` (0 when nothing is queued).
    #[must_use]
    pub(crate) fn pending(&self, name: &str) -> usize {
        self.pending.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of query names with pending writes.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
