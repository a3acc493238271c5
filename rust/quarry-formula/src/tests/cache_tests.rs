use std::{sync::Arc, time::Duration};

use quarry_bitmap::IntSet;
use quarry_txn::{TransactionManager, Versioned};
use rayon::prelude::*;

use crate::{Formula, FormulaCache, FormulaCacheConfig, Stamp};

fn test_config() -> FormulaCacheConfig {
    FormulaCacheConfig {
        min_estimated_cost: 1,
        ..Default::default()
    }
}

fn range(from: u32, to: u32) -> Formula {
    Formula::constant(IntSet::from_keys(from..to))
}

fn query() -> Formula {
    Formula::and(vec![
        Formula::or(vec![range(0, 100), range(200, 300)]),
        range(50, 250),
    ])
}

#[test]
fn test_promotion_after_repeated_requests() {
    let cache = FormulaCache::new(test_config()).unwrap();

    let first = cache.compute(&query());
    assert!(cache.is_empty());
    let second = cache.compute(&query());
    assert_eq!(first, second);
    // both the AND and the nested OR were requested twice
    assert_eq!(cache.len(), 2);

    let applied = cache.apply(&query());
    assert!(applied.is_computed());
    assert!(!applied.children()[0].is_computed());
    assert_eq!(applied.compute(), first);
    assert_eq!(applied.children().len(), 2);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.promotions, 2);
    assert_eq!(stats.misses, 4);
    assert_eq!(stats.entries, 2);
}

#[test]
fn test_cached_node_reports_recorded_cost() {
    let cache = FormulaCache::new(test_config()).unwrap();
    cache.compute(&query());
    cache.compute(&query());

    let fresh = query();
    let applied = cache.apply(&query());
    assert_eq!(applied.cost(), fresh.cost());
    assert_eq!(applied.cost_to_performance(), fresh.cost_to_performance());
    assert!(!applied.children()[0].is_computed());
    assert!(!applied.children()[1].is_computed());
}

#[test]
fn test_cheap_and_ephemeral_formulas_stay_out() {
    let cache = FormulaCache::new(FormulaCacheConfig {
        min_estimated_cost: 1_000_000,
        ..Default::default()
    })
    .unwrap();
    for _ in 0..3 {
        cache.compute(&query());
    }
    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, 0);

    let cache = FormulaCache::new(test_config()).unwrap();
    let local = || {
        Formula::or(vec![
            range(0, 10),
            Formula::ephemeral(IntSet::from_keys([500, 501])),
        ])
    };
    for _ in 0..3 {
        assert_eq!(cache.compute(&local()).len(), 12);
    }
    assert!(cache.is_empty());
}

#[test]
fn test_entries_expire() {
    let cache = FormulaCache::new(FormulaCacheConfig {
        ttl: Duration::from_millis(5),
        ..test_config()
    })
    .unwrap();
    cache.compute(&query());
    cache.compute(&query());
    assert_eq!(cache.len(), 2);

    std::thread::sleep(Duration::from_millis(20));
    let applied = cache.apply(&query());
    assert!(!applied.is_computed());
    assert!(cache.stats().evictions >= 1);
}

#[test]
fn test_capacity_evicts_least_recently_used() {
    let cache = FormulaCache::new(FormulaCacheConfig {
        max_entries: 2,
        ..test_config()
    })
    .unwrap();
    let formula = |offset: u32| Formula::or(vec![range(offset, offset + 10), range(1000, 1010)]);

    for offset in [0, 100, 200] {
        cache.compute(&formula(offset));
        cache.compute(&formula(offset));
    }
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 1);
    // the oldest entry is gone
    assert!(!cache.apply(&formula(0)).is_computed());
    assert!(cache.apply(&formula(200)).is_computed());
}

#[test]
fn test_commit_invalidates_dependent_entries() {
    let manager = TransactionManager::new();
    let cache = Arc::new(FormulaCache::new(test_config()).unwrap());
    manager.add_observer(cache.clone());

    let indexed = Versioned::new(&manager, IntSet::from_keys(0..50));
    let unrelated = Versioned::new(&manager, IntSet::from_keys(0..40));
    let read = |structure: &Versioned<IntSet>| {
        let snapshot = manager.snapshot();
        let (generation, set) = structure.version_at(&snapshot);
        Formula::stamped((*set).clone(), Stamp::new(structure.id(), generation))
    };
    let query = |structure: &Versioned<IntSet>| {
        Formula::or(vec![read(structure), range(100, 120)])
    };

    cache.compute(&query(&indexed));
    cache.compute(&query(&indexed));
    cache.compute(&query(&unrelated));
    cache.compute(&query(&unrelated));
    assert_eq!(cache.len(), 2);

    let mut tx = manager.begin();
    indexed.mutate(&mut tx, |staged| staged.insert(77));
    tx.commit();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().invalidations, 1);
    assert!(cache.apply(&query(&unrelated)).is_computed());
    let fresh = cache.compute(&query(&indexed));
    assert!(fresh.contains(77));
}

#[test]
fn test_config_validation() {
    assert!(FormulaCacheConfig::default().validate().is_ok());
    for config in [
        FormulaCacheConfig {
            max_entries: 0,
            ..Default::default()
        },
        FormulaCacheConfig {
            ttl: Duration::ZERO,
            ..Default::default()
        },
        FormulaCacheConfig {
            promotion_threshold: 0,
            ..Default::default()
        },
    ] {
        assert!(FormulaCache::new(config).is_err());
    }
}

#[test]
fn test_concurrent_queries_agree() {
    let cache = FormulaCache::new(test_config()).unwrap();
    let expected = query().compute();
    let results = (0..64)
        .into_par_iter()
        .map(|_| cache.compute(&query()))
        .collect::<Vec<_>>();
    assert!(results.iter().all(|result| *result == expected));
    assert!(cache.len() <= 2);
    let stats = cache.stats();
    assert!(stats.hits + stats.misses >= 64);
}
