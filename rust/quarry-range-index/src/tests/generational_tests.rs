use std::collections::BTreeMap;

use quarry_txn::{Snapshot, TransactionManager};

use super::keys;
use crate::{RangeIndex, RangeIndexView};

/// Committed intervals by key.
type State = BTreeMap<u32, (i64, i64)>;

fn expected(state: &State, valid: impl Fn(i64, i64) -> bool) -> Vec<u32> {
    state
        .iter()
        .filter(|&(_, &(from, to))| valid(from, to))
        .map(|(&key, _)| key)
        .collect()
}

fn verify(view: &RangeIndexView, state: &State, rng: &mut fastrand::Rng) {
    assert_eq!(view.all_records().to_vec(), state.keys().copied().collect::<Vec<_>>());
    for _ in 0..8 {
        let t = rng.i64(-2..42);
        assert_eq!(
            keys(view.records_enveloping_inclusive(t)),
            expected(state, |from, to| from <= t && t <= to),
            "enveloping {t} in {state:?}"
        );
        assert_eq!(
            keys(view.records_from(t)),
            expected(state, |_, to| to >= t),
            "from {t} in {state:?}"
        );
        assert_eq!(
            keys(view.records_to(t)),
            expected(state, |from, _| from <= t),
            "to {t} in {state:?}"
        );
        let (a, b) = (t, t + rng.i64(0..10));
        assert_eq!(
            keys(view.records_with_ranges_overlapping(a, b)),
            expected(state, |from, to| from <= b && to >= a),
            "overlapping [{a}, {b}] in {state:?}"
        );
    }
}

#[test]
fn test_random_generations_match_model() {
    let mut rng = fastrand::Rng::with_seed(0x5eed_0a11);
    let manager = TransactionManager::new();
    let index = RangeIndex::new(&manager);
    let mut committed = State::new();
    let mut held: Vec<(Snapshot, State)> = Vec::new();

    for _ in 0..200 {
        let mut state = committed.clone();
        let mut tx = manager.begin();
        for _ in 0..rng.usize(1..6) {
            let key = rng.u32(0..30);
            match state.remove(&key) {
                Some((from, to)) => index.remove_record(&mut tx, from, to, key).unwrap(),
                None => {
                    let from = rng.i64(0..40);
                    let to = from + rng.i64(0..10);
                    index.add_record(&mut tx, from, to, key).unwrap();
                    state.insert(key, (from, to));
                }
            }
        }
        verify(&index.view(&tx), &state, &mut rng);

        if rng.u8(0..8) == 0 {
            tx.rollback();
        } else {
            tx.commit();
            committed = state;
        }

        let view = index.view_at(&manager.snapshot());
        verify(&view, &committed, &mut rng);
        for point in view.points().points() {
            assert!(point.is_sentinel() || !point.is_empty());
        }

        if rng.u8(0..5) == 0 {
            held.push((manager.snapshot(), committed.clone()));
        }
        if held.len() > 4 {
            let (snapshot, state) = held.remove(rng.usize(0..held.len()));
            verify(&index.view_at(&snapshot), &state, &mut rng);
        }
    }

    for (snapshot, state) in &held {
        verify(&index.view_at(snapshot), state, &mut rng);
    }
}
