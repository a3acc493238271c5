//! # Quarry: set algebra and transactional indexes over entity keys
//!
//! Quarry is the in-memory query core of an entity catalog. Filtering, facet
//! summaries and validity lookups are all expressed as operations over sets of
//! `u32` primary keys, and every index that produces those sets can be mutated
//! under transactions without disturbing concurrent readers.
//!
//! ## Architecture
//!
//! The system is split into small crates; this one re-exports them so that users
//! can depend on a single crate.
//!
//! * [`bitmap`] - [`IntSet`](bitmap::IntSet), the immutable compressed key set every
//!   other component exchanges
//! * [`formula`] - lazily evaluated formula trees over key sets, their cost model
//!   and the shared formula cache
//! * [`txn`] - multi-version overlays: transactions, snapshots and versioned
//!   structures (bitmaps, sorted arrays, flags)
//! * [`range_index`] - the transactional interval index, queried through formulas
//! * [`common`] - error type, result alias and version identifiers shared by all of
//!   the above
//!
//! ## Data flow
//!
//! A writer opens a [`Transaction`](txn::Transaction), records changes against
//! versioned structures and commits them as one new generation. A reader takes a
//! [`Snapshot`](txn::Snapshot), asks indexes for formulas over the snapshot's
//! version and computes them, optionally through a
//! [`FormulaCache`](formula::FormulaCache) that is invalidated by commits.

pub use quarry_bitmap as bitmap;
pub use quarry_common as common;
pub use quarry_formula as formula;
pub use quarry_range_index as range_index;
pub use quarry_txn as txn;
