//! Shared cache of formula results.
//!
//! The cache sits between query planning and evaluation:
//!
//! 1. [`FormulaCache::apply`] walks a freshly built tree top-down. Every node that is
//!    cacheable and expensive enough is looked up by its cache key. A hit replaces
//!    the node by a copy whose result is already filled in, which cuts evaluation of
//!    the whole subtree. A miss is recorded as a usage of an *adept*.
//! 2. The caller evaluates the returned tree.
//! 3. [`FormulaCache::harvest`] walks the evaluated tree and admits the results of
//!    adepts that were requested often enough.
//!
//! Entries remember the structure stamps of the constants they were computed from.
//! Registered as a [`CommitObserver`], the cache drops every entry derived from a
//! structure that a commit moved to a newer generation.

mod config;
mod stats;

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use ahash::RandomState;
use dashmap::DashMap;
use quarry_bitmap::IntSet;
use quarry_common::{
    Result,
    version::{CommitObserver, Generation, StructureId},
};

pub use config::FormulaCacheConfig;
pub use stats::FormulaCacheStats;

use crate::{
    formula::Formula,
    kind::{FormulaKind, Stamp},
};
use stats::Counters;

/// Adepts kept per admitted entry before the usage counters are reset.
const ADEPTS_PER_ENTRY: usize = 4;

struct CachedEntry {
    result: IntSet,
    /// Actual cost of the subtree the result was computed from.
    cost: u64,
    dependencies: Vec<Stamp>,
    stored_at: Instant,
    last_used: AtomicU64,
}

pub struct FormulaCache {
    config: FormulaCacheConfig,
    entries: DashMap<u64, CachedEntry, RandomState>,
    adepts: DashMap<u64, u32, RandomState>,
    clock: AtomicU64,
    counters: Counters,
}

impl FormulaCache {
    pub fn new(config: FormulaCacheConfig) -> Result<FormulaCache> {
        config.validate()?;
        Ok(FormulaCache {
            config,
            entries: DashMap::with_hasher(RandomState::new()),
            adepts: DashMap::with_hasher(RandomState::new()),
            clock: AtomicU64::new(0),
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &FormulaCacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitutes cached results into `formula`.
    ///
    /// The returned tree has the same shape; nodes found in the cache come back with
    /// their result already computed.
    pub fn apply(&self, formula: &Formula) -> Formula {
        match formula.rewrite(&mut |node| self.lookup(node)) {
            Ok(applied) => applied,
            Err(err) => {
                log::warn!("formula cache skipped a tree it could not rebuild: {err}");
                formula.clone()
            }
        }
    }

    /// Admits the computed results of sufficiently requested nodes of `formula`.
    /// Returns the number of new entries.
    pub fn harvest(&self, formula: &Formula) -> usize {
        let mut promoted = 0;
        formula.visit(&mut |node| {
            if !self.is_candidate(node) {
                return;
            }
            let Some(result) = node.computed_result() else {
                return;
            };
            let key = self.record_key(node);
            if self.entries.contains_key(&key) {
                return;
            }
            let usages = self.adepts.get(&key).map_or(0, |usages| *usages);
            if usages < self.config.promotion_threshold {
                return;
            }
            self.adepts.remove(&key);
            self.entries.insert(
                key,
                CachedEntry {
                    result: result.clone(),
                    cost: node.cost(),
                    dependencies: node.dependencies(),
                    stored_at: Instant::now(),
                    last_used: AtomicU64::new(self.tick()),
                },
            );
            log::debug!(
                "promoted {} (key {key:#018x}, {} keys, estimated cost {}) after {usages} requests",
                node.operation(),
                result.len(),
                node.estimated_cost()
            );
            promoted += 1;
        });
        if promoted > 0 {
            Counters::add(&self.counters.promotions, promoted as u64);
            self.evict();
        }
        promoted
    }

    /// Applies the cache, evaluates the tree and harvests it.
    pub fn compute(&self, formula: &Formula) -> IntSet {
        let applied = self.apply(formula);
        let result = applied.compute();
        self.harvest(&applied);
        result
    }

    /// Drops every entry computed from one of `structures` at a generation older
    /// than `generation`. Returns the number of dropped entries.
    pub fn invalidate(&self, structures: &[StructureId], generation: Generation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            !entry.dependencies.iter().any(|stamp| {
                stamp.generation < generation && structures.contains(&stamp.structure)
            })
        });
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            Counters::add(&self.counters.invalidations, dropped as u64);
            log::debug!("invalidated {dropped} cached formula(s) at {generation}");
        }
        dropped
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.adepts.clear();
    }

    pub fn stats(&self) -> FormulaCacheStats {
        FormulaCacheStats {
            hits: Counters::load(&self.counters.hits),
            misses: Counters::load(&self.counters.misses),
            promotions: Counters::load(&self.counters.promotions),
            invalidations: Counters::load(&self.counters.invalidations),
            evictions: Counters::load(&self.counters.evictions),
            entries: self.entries.len(),
            adepts: self.adepts.len(),
        }
    }

    /// Leaves holding their set already gain nothing from caching.
    fn is_candidate(&self, node: &Formula) -> bool {
        !matches!(node.kind(), FormulaKind::Empty | FormulaKind::Constant(_))
            && node.is_cacheable()
            && node.estimated_cost() >= self.config.min_estimated_cost
    }

    fn record_key(&self, node: &Formula) -> u64 {
        xxhash_rust::xxh3::xxh3_64_with_seed(&node.cache_key().to_le_bytes(), self.config.hash_seed)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup(&self, node: &Formula) -> Option<Formula> {
        if node.is_computed() || !self.is_candidate(node) {
            return None;
        }
        let key = self.record_key(node);

        let mut expired = false;
        let hit = self.entries.get(&key).and_then(|entry| {
            if entry.stored_at.elapsed() > self.config.ttl {
                expired = true;
                None
            } else {
                entry.last_used.store(self.tick(), Ordering::Relaxed);
                Some((entry.result.clone(), entry.cost))
            }
        });
        if expired && self.entries.remove(&key).is_some() {
            Counters::add(&self.counters.evictions, 1);
        }

        match hit {
            Some((result, cost)) => {
                Counters::add(&self.counters.hits, 1);
                log::trace!("cache hit for {} (key {key:#018x})", node.operation());
                Some(node.with_result(result, cost))
            }
            None => {
                Counters::add(&self.counters.misses, 1);
                *self.adepts.entry(key).or_insert(0) += 1;
                if self.adepts.len() > self.config.max_entries.saturating_mul(ADEPTS_PER_ENTRY) {
                    log::debug!("resetting {} formula cache adepts", self.adepts.len());
                    self.adepts.clear();
                }
                None
            }
        }
    }

    /// Drops expired entries, then the least recently used ones beyond capacity.
    fn evict(&self) {
        let before = self.entries.len();
        let ttl = self.config.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);

        let excess = self.entries.len().saturating_sub(self.config.max_entries);
        if excess > 0 {
            let mut by_age = self
                .entries
                .iter()
                .map(|entry| (entry.last_used.load(Ordering::Relaxed), *entry.key()))
                .collect::<Vec<_>>();
            by_age.sort_unstable();
            for (_, key) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            Counters::add(&self.counters.evictions, evicted as u64);
            log::debug!("evicted {evicted} cached formula(s)");
        }
    }
}

impl CommitObserver for FormulaCache {
    fn on_commit(&self, generation: Generation, structures: &[StructureId]) {
        self.invalidate(structures, generation);
    }
}

impl std::fmt::Debug for FormulaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormulaCache")
            .field("entries", &self.entries.len())
            .field("adepts", &self.adepts.len())
            .finish()
    }
}
