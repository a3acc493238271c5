//! Threshold points and the ordered array that holds them.

use std::fmt;

use quarry_bitmap::IntSet;
use quarry_common::{Result, verify_invariant};

/// Threshold of the leftmost sentinel point.
pub const MIN_THRESHOLD: i64 = i64::MIN;

/// Threshold of the rightmost sentinel point.
pub const MAX_THRESHOLD: i64 = i64::MAX;

/// Keys whose intervals start and end at one threshold.
#[derive(Clone, PartialEq, Eq)]
pub struct RangePoint {
    threshold: i64,
    starts: IntSet,
    ends: IntSet,
}

impl RangePoint {
    /// A point with no keys.
    pub fn new(threshold: i64) -> RangePoint {
        RangePoint::with_sets(threshold, IntSet::empty(), IntSet::empty())
    }

    pub fn with_sets(threshold: i64, starts: IntSet, ends: IntSet) -> RangePoint {
        RangePoint {
            threshold,
            starts,
            ends,
        }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Keys whose interval begins at this threshold.
    pub fn starts(&self) -> &IntSet {
        &self.starts
    }

    /// Keys whose interval ends at this threshold.
    pub fn ends(&self) -> &IntSet {
        &self.ends
    }

    pub fn is_sentinel(&self) -> bool {
        self.threshold == MIN_THRESHOLD || self.threshold == MAX_THRESHOLD
    }

    /// Returns `true` if neither an interval starts nor ends here.
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.ends.is_empty()
    }
}

impl fmt::Debug for RangePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold {
            MIN_THRESHOLD => write!(f, "MIN")?,
            MAX_THRESHOLD => write!(f, "MAX")?,
            threshold => write!(f, "{threshold}")?,
        }
        write!(f, ": starts {:?}, ends {:?}", self.starts, self.ends)
    }
}

/// Points ordered by strictly increasing threshold.
///
/// The array always begins with a point at [`MIN_THRESHOLD`] and ends with one at
/// [`MAX_THRESHOLD`]. Every other point holds at least one start or end.
#[derive(Clone, PartialEq, Eq)]
pub struct RangePoints {
    points: Vec<RangePoint>,
}

impl RangePoints {
    /// Only the two sentinels.
    pub fn new() -> RangePoints {
        RangePoints {
            points: vec![
                RangePoint::new(MIN_THRESHOLD),
                RangePoint::new(MAX_THRESHOLD),
            ],
        }
    }

    /// Adopts a prepared array of points.
    ///
    /// Fails with `InvariantViolation` if the sentinels are missing or the thresholds
    /// do not strictly increase.
    pub fn from_points(points: Vec<RangePoint>) -> Result<RangePoints> {
        verify_invariant!(
            points.len() >= 2,
            "at least two range points are expected, got {}",
            points.len()
        );
        verify_invariant!(
            points[0].threshold == MIN_THRESHOLD,
            "first range point must have the minimal threshold, got {}",
            points[0].threshold
        );
        let last = points[points.len() - 1].threshold;
        verify_invariant!(
            last == MAX_THRESHOLD,
            "last range point must have the maximal threshold, got {last}"
        );
        for pair in points.windows(2) {
            verify_invariant!(
                pair[0].threshold < pair[1].threshold,
                "range thresholds are not monotonic: {} followed by {}",
                pair[0].threshold,
                pair[1].threshold
            );
        }
        Ok(RangePoints { points })
    }

    pub(crate) fn from_sorted(points: Vec<RangePoint>) -> RangePoints {
        RangePoints { points }
    }

    pub fn points(&self) -> &[RangePoint] {
        &self.points
    }

    /// Number of points, sentinels included.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Index of the point at `threshold` or, if there is none, `-(insertion_index) - 1`.
    pub fn find_threshold(&self, threshold: i64) -> isize {
        match self.locate(threshold) {
            Ok(index) => index as isize,
            Err(insertion) => -(insertion as isize) - 1,
        }
    }

    /// `Ok` with the index of the point at `threshold`, or `Err` with the index at
    /// which such a point would be inserted.
    pub fn locate(&self, threshold: i64) -> std::result::Result<usize, usize> {
        self.points
            .binary_search_by(|point| point.threshold.cmp(&threshold))
    }

    pub fn get(&self, threshold: i64) -> Option<&RangePoint> {
        self.locate(threshold).ok().map(|index| &self.points[index])
    }

    /// Returns `true` if any interval of `key` is registered.
    pub fn contains(&self, key: u32) -> bool {
        self.points
            .iter()
            .any(|point| point.starts.contains(key) || point.ends.contains(key))
    }

    /// Every key that has both a start and an end registered.
    pub fn all_records(&self) -> IntSet {
        let starts = IntSet::union_all(self.points.iter().map(RangePoint::starts));
        if starts.is_empty() {
            return starts;
        }
        starts.intersect(&IntSet::union_all(self.points.iter().map(RangePoint::ends)))
    }

    /// Number of distinct keys in the index.
    pub fn len(&self) -> u64 {
        self.all_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(RangePoint::is_empty)
    }
}

impl Default for RangePoints {
    fn default() -> Self {
        RangePoints::new()
    }
}

impl fmt::Debug for RangePoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.points).finish()
    }
}
