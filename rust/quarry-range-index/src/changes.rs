//! Pending changes of [`RangePoints`] and how they merge into a new version.

use std::collections::BTreeMap;

use quarry_bitmap::IntSet;
use quarry_txn::{BitmapChanges, Changes, Transactional};

use crate::point::{RangePoint, RangePoints};

/// Changes of the starts and ends at one threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointChanges {
    starts: BitmapChanges,
    ends: BitmapChanges,
}

impl PointChanges {
    pub fn starts(&self) -> &BitmapChanges {
        &self.starts
    }

    pub fn ends(&self) -> &BitmapChanges {
        &self.ends
    }

    fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.ends.is_empty()
    }

    /// The point these changes produce at a threshold that has none yet.
    fn create(&self, threshold: i64) -> Option<RangePoint> {
        let point = RangePoint::new(threshold);
        self.apply_to(&point).filter(|point| !point.is_empty())
    }

    /// `point` with the changes applied, or `None` if they have no effect on it.
    fn apply_to(&self, point: &RangePoint) -> Option<RangePoint> {
        let starts = self.starts.apply_to(point.starts());
        let ends = self.ends.apply_to(point.ends());
        if starts.is_none() && ends.is_none() {
            return None;
        }
        Some(RangePoint::with_sets(
            point.threshold(),
            starts.unwrap_or_else(|| point.starts().clone()),
            ends.unwrap_or_else(|| point.ends().clone()),
        ))
    }
}

/// Start and end registrations recorded by one transaction, by threshold.
///
/// Every operation takes the points the transaction reads and coalesces against
/// the sets at the threshold (empty where the base has no point), so registering
/// and unregistering the same interval leaves nothing behind.
#[derive(Debug, Clone, Default)]
pub struct RangePointsChanges {
    points: BTreeMap<i64, PointChanges>,
}

impl RangePointsChanges {
    /// Registers `key` as starting at `from` and ending at `to`.
    pub fn add_record(&mut self, base: &RangePoints, from: i64, to: i64, key: u32) {
        self.add_start(base, from, key);
        self.add_end(base, to, key);
    }

    pub fn remove_record(&mut self, base: &RangePoints, from: i64, to: i64, key: u32) {
        self.remove_start(base, from, key);
        self.remove_end(base, to, key);
    }

    pub fn add_start(&mut self, base: &RangePoints, threshold: i64, key: u32) {
        self.update(base, threshold, |point, changes| {
            changes.starts.insert(point.starts(), key)
        });
    }

    pub fn remove_start(&mut self, base: &RangePoints, threshold: i64, key: u32) {
        self.update(base, threshold, |point, changes| {
            changes.starts.remove(point.starts(), key)
        });
    }

    pub fn add_end(&mut self, base: &RangePoints, threshold: i64, key: u32) {
        self.update(base, threshold, |point, changes| {
            changes.ends.insert(point.ends(), key)
        });
    }

    pub fn remove_end(&mut self, base: &RangePoints, threshold: i64, key: u32) {
        self.update(base, threshold, |point, changes| {
            changes.ends.remove(point.ends(), key)
        });
    }

    /// Registers every key of `keys` over the same interval.
    pub fn add_records(&mut self, base: &RangePoints, from: i64, to: i64, keys: &IntSet) {
        self.update(base, from, |point, changes| {
            changes.starts.insert_all(point.starts(), keys)
        });
        self.update(base, to, |point, changes| {
            changes.ends.insert_all(point.ends(), keys)
        });
    }

    pub fn get(&self, threshold: i64) -> Option<&PointChanges> {
        self.points.get(&threshold)
    }

    /// Thresholds with recorded changes, ascending.
    pub fn thresholds(&self) -> impl Iterator<Item = i64> + '_ {
        self.points.keys().copied()
    }

    /// Runs `f` on the changes at `threshold` and the base point there, then drops
    /// the entry if it ended up empty.
    fn update(
        &mut self,
        base: &RangePoints,
        threshold: i64,
        f: impl FnOnce(&RangePoint, &mut PointChanges),
    ) {
        let missing;
        let point = match base.get(threshold) {
            Some(point) => point,
            None => {
                missing = RangePoint::new(threshold);
                &missing
            }
        };
        let changes = self.points.entry(threshold).or_default();
        f(point, changes);
        if changes.is_empty() {
            self.points.remove(&threshold);
        }
    }
}

impl Changes for RangePointsChanges {
    fn is_empty(&self) -> bool {
        self.points.values().all(PointChanges::is_empty)
    }
}

impl Transactional for RangePoints {
    type Changes = RangePointsChanges;

    /// Merges the changed thresholds into the point array. Points left without any
    /// start or end are dropped, sentinels excepted.
    fn apply(&self, changes: &RangePointsChanges) -> Option<RangePoints> {
        let mut merged = Vec::with_capacity(self.point_count() + changes.points.len());
        let mut changed = false;
        let mut pending = changes.points.iter().peekable();

        for point in self.points() {
            while let Some((&threshold, point_changes)) =
                pending.next_if(|(threshold, _)| **threshold < point.threshold())
            {
                if let Some(created) = point_changes.create(threshold) {
                    merged.push(created);
                    changed = true;
                }
            }
            match pending.next_if(|(threshold, _)| **threshold == point.threshold()) {
                Some((_, point_changes)) => match point_changes.apply_to(point) {
                    Some(updated) => {
                        changed = true;
                        if !updated.is_empty() || updated.is_sentinel() {
                            merged.push(updated);
                        }
                    }
                    None => merged.push(point.clone()),
                },
                None => merged.push(point.clone()),
            }
        }

        changed.then(|| RangePoints::from_sorted(merged))
    }
}
