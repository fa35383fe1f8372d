//! Single-slot memoization for per-selection query results.
//!
//! A dashboard session only ever looks at one filter combination at a
//! time, so one slot is enough: changing the key evicts the previous
//! value, re-selecting the same key is a hit.

/// One-entry cache keyed by an equality-comparable key.
#[derive(Debug, Default)]
pub struct SingleSlotCache<K, V> {
    slot: Option<(K, V)>,
}

impl<K: PartialEq, V> SingleSlotCache<K, V> {
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// The cached value, built on miss. A key change rebuilds.
    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> V) -> &mut V {
        let hit = matches!(&self.slot, Some((cached, _)) if *cached == key);
        if !hit {
            self.slot = Some((key, build()));
        }
        // The slot is filled on both paths.
        match &mut self.slot {
            Some((_, value)) => value,
            None => unreachable!(),
        }
    }

    /// Drop the cached entry, whatever its key.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    #[must_use]
    pub fn cached_key(&self) -> Option<&K> {
        self.slot.as_ref().map(|(key, _)| key)
    }
}
