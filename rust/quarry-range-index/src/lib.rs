//! Transactional index of validity intervals.
//!
//! A [`RangeIndex`] maps `u32` keys to closed intervals `[from, to]` of `i64`
//! thresholds. Internally it is an array of [`RangePoint`]s sorted by threshold, each
//! holding the keys whose interval starts there and the keys whose interval ends
//! there. Two sentinel points at [`MIN_THRESHOLD`] and [`MAX_THRESHOLD`] are always
//! present; any other point disappears as soon as it holds no key.
//!
//! The array is versioned with [`quarry_txn`]: mutations are recorded into a
//! transaction and published atomically on commit, readers query the version of
//! their snapshot. Queries do not compute anything themselves, they return a
//! [`Formula`](quarry_formula::Formula) over the per-point sets:
//!
//! - [`records_from`](RangeIndexView::records_from) and
//!   [`records_to`](RangeIndexView::records_to) union the ends (starts) on one side
//!   of the threshold.
//! - [`records_enveloping_inclusive`](RangeIndexView::records_enveloping_inclusive)
//!   and [`records_with_ranges_overlapping`](RangeIndexView::records_with_ranges_overlapping)
//!   count starts against ends with `Join` and `Disentangle`, which keeps keys with
//!   several disjoint intervals correct.

pub mod changes;
pub mod index;
pub mod point;
pub mod view;

#[cfg(test)]
mod tests;

pub use changes::{PointChanges, RangePointsChanges};
pub use index::RangeIndex;
pub use point::{MAX_THRESHOLD, MIN_THRESHOLD, RangePoint, RangePoints};
pub use view::RangeIndexView;
