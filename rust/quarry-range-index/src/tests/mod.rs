mod generational_tests;
mod transaction_tests;

use quarry_formula::Formula;
use quarry_txn::TransactionManager;

use crate::{RangeIndex, RangeIndexView};

/// Builds an index and commits `records` in a single transaction.
fn committed_index(records: &[(i64, i64, u32)]) -> (TransactionManager, RangeIndex) {
    let manager = TransactionManager::new();
    let index = RangeIndex::new(&manager);
    let mut tx = manager.begin();
    for &(from, to, key) in records {
        index.add_record(&mut tx, from, to, key).unwrap();
    }
    tx.commit();
    (manager, index)
}

fn latest(manager: &TransactionManager, index: &RangeIndex) -> RangeIndexView {
    index.view_at(&manager.snapshot())
}

fn keys(formula: Formula) -> Vec<u32> {
    formula.compute().to_vec()
}

fn layout(view: &RangeIndexView) -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    view.points()
        .points()
        .iter()
        .map(|point| (point.starts().to_vec(), point.ends().to_vec()))
        .unzip()
}
