use std::collections::BTreeSet;

use quarry_bitmap::IntSet;

use crate::{Snapshot, SortedArray, TransactionManager, Versioned};

/// Committed model state per generation, and snapshots held at random points.
struct Model {
    history: Vec<BTreeSet<u32>>,
    held: Vec<(Snapshot, usize)>,
}

#[test]
fn test_random_generations_match_model() {
    let mut rng = fastrand::Rng::with_seed(0x5eed_0001);
    let manager = TransactionManager::new();
    let set = Versioned::new(&manager, IntSet::empty());
    let mut model = Model {
        history: vec![BTreeSet::new()],
        held: Vec::new(),
    };

    for _ in 0..300 {
        let mut expected = model.history.last().cloned().unwrap_or_default();
        let mut tx = manager.begin();
        for _ in 0..rng.usize(0..8) {
            let key = rng.u32(0..64);
            if rng.bool() {
                set.mutate(&mut tx, |staged| staged.insert(key));
                expected.insert(key);
            } else {
                set.mutate(&mut tx, |staged| staged.remove(key));
                expected.remove(&key);
            }
        }
        assert_eq!(
            set.read(&tx).to_vec(),
            expected.iter().copied().collect::<Vec<_>>()
        );

        if rng.u8(0..10) == 0 {
            tx.rollback();
        } else {
            let info = tx.commit();
            if !info.is_empty() {
                model.history.push(expected);
            }
        }
        assert_eq!(
            manager.visible_generation().as_u64() as usize,
            model.history.len() - 1
        );

        if rng.u8(0..4) == 0 {
            model
                .held
                .push((manager.snapshot(), model.history.len() - 1));
        }
        if !model.held.is_empty() && rng.u8(0..3) == 0 {
            let index = rng.usize(0..model.held.len());
            model.held.swap_remove(index);
        }

        for (snapshot, generation) in &model.held {
            let seen = set.read_at(snapshot).to_vec();
            let expected = model.history[*generation].iter().copied().collect::<Vec<_>>();
            assert_eq!(seen, expected);
        }
    }

    model.held.clear();
    assert_eq!(manager.pinned_snapshot_count(), 0);
}

#[test]
fn test_random_sorted_array_against_btree() {
    let mut rng = fastrand::Rng::with_seed(42);
    let manager = TransactionManager::new();
    let array = Versioned::new(&manager, SortedArray::<i64>::new());
    let mut expected = BTreeSet::new();

    for _ in 0..100 {
        let mut tx = manager.begin();
        let mut next = expected.clone();
        for _ in 0..rng.usize(1..6) {
            let value = rng.i64(-50..50);
            if rng.bool() {
                array.mutate(&mut tx, |staged| staged.insert(value));
                next.insert(value);
            } else {
                array.mutate(&mut tx, |staged| staged.remove(value));
                next.remove(&value);
            }
        }
        tx.commit();
        expected = next;
        assert_eq!(
            array.read_base().as_slice(),
            expected.iter().copied().collect::<Vec<_>>().as_slice()
        );
    }
}
