//! The transactional range index.

use log::{debug, trace};
use quarry_bitmap::IntSet;
use quarry_common::{Result, verify_arg};
use quarry_formula::Stamp;
use quarry_txn::{
    Snapshot, StructureId, Transaction, TransactionManager, Transactional, Versioned,
};

use crate::{
    changes::RangePointsChanges,
    point::{RangePoint, RangePoints},
    view::RangeIndexView,
};

/// Intervals `[from, to]` of `u32` keys, versioned by a [`TransactionManager`].
///
/// Each interval registers its key in the starts of the `from` point and in the ends
/// of the `to` point. A key may own several disjoint intervals, but two intervals of
/// the same key must not share a boundary threshold: the index keeps one bit per
/// key and point, so removing one of them would also drop the other's boundary.
///
/// Mutations go through a transaction; queries go through a [`RangeIndexView`].
#[derive(Clone, Debug)]
pub struct RangeIndex {
    points: Versioned<RangePoints>,
}

impl RangeIndex {
    /// An index holding only the two sentinel points.
    pub fn new(manager: &TransactionManager) -> RangeIndex {
        RangeIndex {
            points: Versioned::new(manager, RangePoints::new()),
        }
    }

    /// An index over prepared points. See [`RangePoints::from_points`] for the checks.
    pub fn from_points(manager: &TransactionManager, points: Vec<RangePoint>) -> Result<RangeIndex> {
        let points = RangePoints::from_points(points)?;
        Ok(RangeIndex {
            points: Versioned::new(manager, points),
        })
    }

    /// An index in which every key of `keys` owns the interval `[from, to]`.
    pub fn with_records(
        manager: &TransactionManager,
        from: i64,
        to: i64,
        keys: impl IntoIterator<Item = u32>,
    ) -> Result<RangeIndex> {
        verify_arg!(from, from <= to);
        let keys = IntSet::from_keys(keys);
        let empty = RangePoints::new();
        let mut changes = RangePointsChanges::default();
        changes.add_records(&empty, from, to, &keys);
        let points = empty.apply(&changes).unwrap_or_default();
        debug!("range index built with {} keys over [{from}, {to}]", keys.len());
        Ok(RangeIndex {
            points: Versioned::new(manager, points),
        })
    }

    pub fn id(&self) -> StructureId {
        self.points.id()
    }

    /// Registers the interval `[from, to]` of `key` within `tx`.
    pub fn add_record(&self, tx: &mut Transaction, from: i64, to: i64, key: u32) -> Result<()> {
        verify_arg!(from, from <= to);
        trace!("range index {}: add {key} [{from}, {to}]", self.id());
        self.points.mutate(tx, |staged| {
            let (base, changes) = staged.parts();
            changes.add_record(base, from, to, key)
        });
        Ok(())
    }

    /// Unregisters the interval `[from, to]` of `key` within `tx`.
    pub fn remove_record(&self, tx: &mut Transaction, from: i64, to: i64, key: u32) -> Result<()> {
        verify_arg!(from, from <= to);
        trace!("range index {}: remove {key} [{from}, {to}]", self.id());
        self.points.mutate(tx, |staged| {
            let (base, changes) = staged.parts();
            changes.remove_record(base, from, to, key)
        });
        Ok(())
    }

    /// The committed version as of `snapshot`.
    pub fn view_at(&self, snapshot: &Snapshot) -> RangeIndexView {
        let (generation, points) = self.points.version_at(snapshot);
        RangeIndexView::committed(points, Stamp::new(self.id(), generation))
    }

    /// The index as seen by `tx`, including its own uncommitted changes.
    pub fn view(&self, tx: &Transaction) -> RangeIndexView {
        if self.points.has_changes(tx) {
            RangeIndexView::uncommitted(self.points.read(tx))
        } else {
            self.view_at(tx.snapshot())
        }
    }

    /// Number of versions kept for snapshot readers.
    pub fn retained_versions(&self) -> usize {
        self.points.retained_versions()
    }
}
