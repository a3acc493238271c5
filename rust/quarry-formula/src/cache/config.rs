use std::time::Duration;

use quarry_common::{Result, verify_arg};

/// Configuration parameters for a [`FormulaCache`](super::FormulaCache).
///
/// `FormulaCacheConfig` controls which formulas are worth caching and how long
/// their results are kept.
///
/// # Fields
///
/// * `max_entries` - Upper bound of cached results. When exceeded, the least
///   recently used entries are evicted.
/// * `ttl` - Time after which a cached result is dropped regardless of use.
/// * `min_estimated_cost` - Formulas whose [estimated cost](crate::Formula::estimated_cost)
///   is below this threshold are cheaper to recompute than to look up, and are
///   never considered.
/// * `promotion_threshold` - Number of times a formula has to be requested before
///   its computed result is admitted into the cache.
/// * `hash_seed` - Seed mixed into every cache key, separating the key spaces of
///   independent caches.
#[derive(Debug, Clone)]
pub struct FormulaCacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
    pub min_estimated_cost: u64,
    pub promotion_threshold: u32,
    pub hash_seed: u64,
}

impl Default for FormulaCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(600),
            min_estimated_cost: 1_000,
            promotion_threshold: 2,
            hash_seed: 0x8f3a_21c4_6b5d_9e07,
        }
    }
}

impl FormulaCacheConfig {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_entries, self.max_entries > 0);
        verify_arg!(ttl, !self.ttl.is_zero());
        verify_arg!(promotion_threshold, self.promotion_threshold > 0);
        Ok(())
    }
}
