use std::sync::Arc;

use quarry_bitmap::IntSet;
use quarry_common::error::ErrorKind;
use quarry_formula::{FormulaCache, FormulaCacheConfig};
use quarry_txn::{Generation, TransactionManager};

use super::{committed_index, keys, latest, layout};
use crate::{MAX_THRESHOLD, MIN_THRESHOLD, RangeIndex, RangePoint, RangePoints};

const RECORDS: [(i64, i64, u32); 4] = [(5, 10, 1), (5, 10, 2), (7, 10, 3), (1, 5, 4)];

#[test]
fn test_add_and_commit() {
    let manager = TransactionManager::new();
    let index = RangeIndex::new(&manager);

    let mut tx = manager.begin();
    for (from, to, key) in RECORDS {
        index.add_record(&mut tx, from, to, key).unwrap();
    }
    assert!(latest(&manager, &index).is_empty());
    assert_eq!(index.view(&tx).len(), 4);
    let info = tx.commit();
    assert_eq!(info.published, vec![index.id()]);

    let view = latest(&manager, &index);
    let (starts, ends) = layout(&view);
    assert_eq!(
        starts,
        vec![vec![], vec![4], vec![1, 2], vec![3], vec![], vec![]]
    );
    assert_eq!(
        ends,
        vec![vec![], vec![], vec![4], vec![], vec![1, 2, 3], vec![]]
    );
    assert!(view.contains(3));
    assert!(!view.contains(5));
    assert_eq!(view.all_records().to_vec(), vec![1, 2, 3, 4]);
}

#[test]
fn test_add_and_rollback() {
    let (manager, index) = committed_index(&RECORDS[..2]);
    let before = latest(&manager, &index);

    let mut tx = manager.begin();
    index.add_record(&mut tx, 7, 10, 3).unwrap();
    index.remove_record(&mut tx, 5, 10, 1).unwrap();
    let pending = index.view(&tx);
    assert_eq!(pending.all_records().to_vec(), vec![2, 3]);
    assert!(pending.stamp().is_none());
    tx.rollback();

    let after = latest(&manager, &index);
    assert_eq!(after.points(), before.points());
    assert_eq!(after.stamp(), before.stamp());
    assert_eq!(manager.visible_generation(), Generation::new(1));
}

#[test]
fn test_add_then_remove_leaves_sentinels() {
    let (manager, index) = committed_index(&[(5, 10, 1)]);
    assert!(latest(&manager, &index).contains(1));

    let mut tx = manager.begin();
    index.remove_record(&mut tx, 5, 10, 1).unwrap();
    tx.commit();

    let view = latest(&manager, &index);
    assert!(!view.contains(1));
    assert_eq!(view.points(), &RangePoints::new());
    assert_eq!(view.points().point_count(), 2);
    assert_eq!(view.len(), 0);
}

#[test]
fn test_add_and_remove_in_one_transaction() {
    let manager = TransactionManager::new();
    let index = RangeIndex::new(&manager);

    let mut tx = manager.begin();
    for (from, to, key) in RECORDS {
        index.add_record(&mut tx, from, to, key).unwrap();
    }
    for (from, to, key) in RECORDS {
        index.remove_record(&mut tx, from, to, key).unwrap();
    }
    assert!(index.view(&tx).is_empty());
    let info = tx.commit();

    assert!(info.is_empty());
    assert_eq!(manager.visible_generation(), Generation::ZERO);
    assert_eq!(index.retained_versions(), 1);
}

#[test]
fn test_cancelled_record_keeps_concurrent_record() {
    let (manager, index) = committed_index(&[(1, 5, 100)]);

    let mut t1 = manager.begin();
    let mut t2 = manager.begin();
    index.add_record(&mut t1, 5, 9, 7).unwrap();
    index.remove_record(&mut t1, 5, 9, 7).unwrap();
    index.remove_record(&mut t1, 1, 5, 100).unwrap();
    index.add_record(&mut t1, 1, 5, 100).unwrap();
    assert!(!t1.is_dirty());

    index.add_record(&mut t2, 5, 9, 7).unwrap();
    t2.commit();
    assert!(t1.commit().is_empty());

    let view = latest(&manager, &index);
    assert_eq!(view.all_records().to_vec(), vec![7, 100]);
    assert_eq!(keys(view.records_enveloping_inclusive(7)), vec![7]);
    assert_eq!(manager.visible_generation(), Generation::new(2));
}

#[test]
fn test_removals_and_additions_on_shared_points() {
    let shared = IntSet::from_keys([1, 3, 5, 11, 13, 14, 15]);
    let manager = TransactionManager::new();
    let index = RangeIndex::from_points(
        &manager,
        vec![
            RangePoint::new(MIN_THRESHOLD),
            RangePoint::with_sets(1, shared.clone(), IntSet::empty()),
            RangePoint::with_sets(2, IntSet::empty(), shared),
            RangePoint::new(MAX_THRESHOLD),
        ],
    )
    .unwrap();

    let mut tx = manager.begin();
    for key in [11, 13, 15] {
        index.remove_record(&mut tx, 1, 2, key).unwrap();
    }
    index.add_record(&mut tx, 1, 2, 100).unwrap();
    for key in [1, 5, 3] {
        index.remove_record(&mut tx, 1, 2, key).unwrap();
    }
    tx.commit();

    let view = latest(&manager, &index);
    let (starts, ends) = layout(&view);
    assert_eq!(starts, vec![vec![], vec![14, 100], vec![], vec![]]);
    assert_eq!(ends, vec![vec![], vec![], vec![14, 100], vec![]]);
}

#[test]
fn test_snapshot_keeps_old_answers() {
    let (manager, index) = committed_index(&[(1, 5, 100)]);
    let old = manager.snapshot();

    let mut tx = manager.begin();
    index.add_record(&mut tx, 3, 8, 200).unwrap();
    index.remove_record(&mut tx, 1, 5, 100).unwrap();
    tx.commit();

    let old_view = index.view_at(&old);
    let new_view = latest(&manager, &index);
    assert_eq!(keys(old_view.records_enveloping_inclusive(4)), vec![100]);
    assert_eq!(keys(new_view.records_enveloping_inclusive(4)), vec![200]);
    assert_eq!(old_view.stamp().map(|s| s.generation), Some(Generation::new(1)));
    assert_eq!(new_view.stamp().map(|s| s.generation), Some(Generation::new(2)));
    assert_eq!(index.retained_versions(), 2);

    drop(old_view);
    drop(old);
    let mut tx = manager.begin();
    index.add_record(&mut tx, 9, 9, 300).unwrap();
    tx.commit();
    assert_eq!(index.retained_versions(), 1);
}

#[test]
fn test_transaction_view_is_ephemeral() {
    let (manager, index) = committed_index(&[(1, 5, 100)]);

    let mut tx = manager.begin();
    let clean = index.view(&tx);
    assert!(clean.stamp().is_some());
    assert!(clean.records_from(2).is_cacheable());

    index.add_record(&mut tx, 3, 8, 200).unwrap();
    let dirty = index.view(&tx);
    let formula = dirty.records_from(2);
    assert!(!formula.is_cacheable());
    assert_eq!(keys(formula), vec![100, 200]);
    assert!(
        dirty
            .records_with_ranges_overlapping(0, 10)
            .dependencies()
            .is_empty()
    );
}

#[test]
fn test_invalid_intervals_are_rejected() {
    let manager = TransactionManager::new();
    let index = RangeIndex::new(&manager);
    let mut tx = manager.begin();

    let err = index.add_record(&mut tx, 10, 5, 1).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { name, .. } if name == "from"));
    assert!(index.remove_record(&mut tx, 10, 5, 1).is_err());
    assert!(RangeIndex::with_records(&manager, 3, 2, [1]).is_err());
    assert!(!tx.is_dirty());

    let err = RangeIndex::from_points(&manager, vec![RangePoint::new(0)]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvariantViolation { .. }));
}

#[test]
fn test_with_records() {
    let manager = TransactionManager::new();
    let index = RangeIndex::with_records(&manager, 3, 9, [4, 2, 8]).unwrap();
    let view = latest(&manager, &index);

    assert_eq!(view.points().point_count(), 4);
    assert_eq!(keys(view.records_enveloping_inclusive(5)), vec![2, 4, 8]);
    assert_eq!(view.len(), 3);
}

#[test]
fn test_commit_invalidates_cached_queries() {
    let (manager, index) = committed_index(&[(1, 5, 100), (10, 20, 200)]);
    let cache = Arc::new(
        FormulaCache::new(FormulaCacheConfig {
            min_estimated_cost: 1,
            ..Default::default()
        })
        .unwrap(),
    );
    manager.add_observer(cache.clone());

    let query = || latest(&manager, &index).records_with_ranges_overlapping(4, 11);
    cache.compute(&query());
    cache.compute(&query());
    assert!(!cache.is_empty());
    assert!(cache.apply(&query()).is_computed());

    let mut tx = manager.begin();
    index.add_record(&mut tx, 6, 7, 300).unwrap();
    tx.commit();

    assert!(cache.is_empty());
    assert_eq!(keys(cache.apply(&query())), vec![100, 200, 300]);
}
