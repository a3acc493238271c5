//! Range queries over one version of the index.

use std::sync::Arc;

use quarry_bitmap::IntSet;
use quarry_formula::{
    Formula, Stamp,
    factory::{
        and_if_necessary, disentangle_if_necessary, join_if_necessary, or_if_necessary,
    },
};

use crate::point::{RangePoint, RangePoints};

/// One version of a [`RangeIndex`](crate::RangeIndex), queried through formulas.
///
/// Formulas built from a committed version carry constants stamped with the
/// structure and generation they were read from. A view that includes changes of
/// an open transaction builds ephemeral constants, which keep every formula over
/// them out of the shared cache.
#[derive(Clone)]
pub struct RangeIndexView {
    points: Arc<RangePoints>,
    stamp: Option<Stamp>,
}

impl RangeIndexView {
    pub(crate) fn committed(points: Arc<RangePoints>, stamp: Stamp) -> RangeIndexView {
        RangeIndexView {
            points,
            stamp: Some(stamp),
        }
    }

    pub(crate) fn uncommitted(points: Arc<RangePoints>) -> RangeIndexView {
        RangeIndexView {
            points,
            stamp: None,
        }
    }

    pub fn points(&self) -> &RangePoints {
        &self.points
    }

    /// Structure and generation of the version, or `None` for a view with
    /// uncommitted changes.
    pub fn stamp(&self) -> Option<Stamp> {
        self.stamp
    }

    pub fn find_threshold(&self, threshold: i64) -> isize {
        self.points.find_threshold(threshold)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.points.contains(key)
    }

    pub fn all_records(&self) -> IntSet {
        self.points.all_records()
    }

    pub fn len(&self) -> u64 {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keys with an interval that reaches `threshold` or lies after it.
    pub fn records_from(&self, threshold: i64) -> Formula {
        let points = self.points.points();
        let start = match self.points.locate(threshold) {
            Ok(index) | Err(index) => index,
        };
        or_if_necessary(self.ends(&points[start..]))
    }

    /// Keys with an interval that reaches `threshold` or lies before it.
    pub fn records_to(&self, threshold: i64) -> Formula {
        let points = self.points.points();
        let end = match self.points.locate(threshold) {
            Ok(index) => index + 1,
            Err(index) => index,
        };
        or_if_necessary(self.starts(&points[..end]))
    }

    /// Keys with an interval that contains `threshold`, bounds included.
    ///
    /// A key is valid at the threshold if it started more often than it ended up to
    /// there, and ends more often than it starts afterwards. Keys starting or ending
    /// exactly at the threshold are added explicitly.
    pub fn records_enveloping_inclusive(&self, threshold: i64) -> Formula {
        let points = self.points.points();
        let (split, exact) = match self.points.locate(threshold) {
            Ok(index) => (index + 1, Some(&points[index])),
            Err(index) => (index, None),
        };
        let (before, after) = points.split_at(split);
        let envelope = self.spanning(before, after);
        match exact {
            Some(point) => or_if_necessary(vec![
                envelope,
                self.constant(point.starts()),
                self.constant(point.ends()),
            ]),
            None => envelope,
        }
    }

    /// Keys with an interval that intersects `[from, to]`.
    ///
    /// Collects the keys starting or ending inside the window and the keys whose
    /// interval spans the whole window. An inverted window selects nothing.
    pub fn records_with_ranges_overlapping(&self, from: i64, to: i64) -> Formula {
        if from > to {
            return Formula::empty();
        }
        let points = self.points.points();
        let start = match self.points.locate(from) {
            Ok(index) | Err(index) => index,
        };
        // Index 0 holds the minimal threshold, so a missing `to` inserts at 1 or later.
        let end = match self.points.locate(to) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let (low, high) = (start.min(end), start.max(end));

        let mut children = Vec::new();
        if start <= end {
            children.extend(self.starts(&points[start..=end]));
            children.extend(self.ends(&points[start..=end]));
        }
        children.push(self.spanning(&points[..=low], &points[high..]));
        or_if_necessary(children)
    }

    /// Keys opened but not closed within `before` and closed but not reopened within
    /// `after`.
    fn spanning(&self, before: &[RangePoint], after: &[RangePoint]) -> Formula {
        and_if_necessary(vec![
            disentangle_if_necessary(
                join_if_necessary(self.starts(before)),
                join_if_necessary(self.ends(before)),
            ),
            disentangle_if_necessary(
                join_if_necessary(self.ends(after)),
                join_if_necessary(self.starts(after)),
            ),
        ])
    }

    fn starts(&self, points: &[RangePoint]) -> Vec<Formula> {
        self.constants(points.iter().map(RangePoint::starts))
    }

    fn ends(&self, points: &[RangePoint]) -> Vec<Formula> {
        self.constants(points.iter().map(RangePoint::ends))
    }

    fn constants<'a>(&self, sets: impl Iterator<Item = &'a IntSet>) -> Vec<Formula> {
        sets.filter(|set| !set.is_empty())
            .map(|set| self.constant(set))
            .collect()
    }

    fn constant(&self, set: &IntSet) -> Formula {
        if set.is_empty() {
            return Formula::empty();
        }
        match self.stamp {
            Some(stamp) => Formula::stamped(set.clone(), stamp),
            None => Formula::ephemeral(set.clone()),
        }
    }
}

impl std::fmt::Debug for RangeIndexView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeIndexView")
            .field("stamp", &self.stamp)
            .field("points", &self.points)
            .finish()
    }
}
