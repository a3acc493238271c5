use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters of a [`FormulaCache`](super::FormulaCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulaCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub promotions: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub entries: usize,
    pub adepts: usize,
}

impl FormulaCacheStats {
    /// Share of lookups answered from the cache, `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) promotions: AtomicU64,
    pub(crate) invalidations: AtomicU64,
    pub(crate) evictions: AtomicU64,
}

impl Counters {
    pub(crate) fn add(counter: &AtomicU64, value: u64) {
        counter.fetch_add(value, Ordering::Relaxed);
    }

    pub(crate) fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
