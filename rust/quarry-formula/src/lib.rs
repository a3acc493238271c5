//! Lazily evaluated set algebra over [`IntSet`](quarry_bitmap::IntSet)s.
//!
//! A [`Formula`] is an immutable expression tree. Each node computes its key set
//! from its children on first demand and memoizes the result, so a shared subtree
//! is evaluated once no matter how many parents reference it. Nodes also expose a
//! cheap cost model used to order evaluation (see [`Formula::estimated_cost`]) and a
//! content-addressable [`cache_key`](Formula::cache_key) used by the shared
//! [`FormulaCache`].
//!
//! Node kinds form a closed set ([`FormulaKind`]):
//!
//! | kind | result |
//! |------|--------|
//! | `Empty` | the empty set |
//! | `Constant` | a precomputed set |
//! | `And`, `UserFilter` | intersection of children |
//! | `Or`, `ScopeContainer` | union of children |
//! | `Join` | union of children, remembering how many children hold each key |
//! | `Not(subtracted, superset)` | `superset \ subtracted` |
//! | `Disentangle(left, right)` | keys occurring more often in `left` than in `right` |
//! | `CombinedFacet(and, or)` | intersection of both parts |
//! | `FacetGroupAnd`, `FacetGroupOr` | intersection / union of per-facet bitmaps |
//!
//! The [`factory`] module offers constructors that collapse trivial shapes
//! (no input to `Empty`, a single input to itself).

pub mod cache;
mod evaluate;
pub mod factory;
pub mod facet;
pub mod formula;
mod identity;
pub mod kind;
pub mod walk;

#[cfg(test)]
mod tests;

pub use cache::{FormulaCache, FormulaCacheConfig, FormulaCacheStats};
pub use facet::FacetGroup;
pub use formula::Formula;
pub use kind::{Constant, FormulaKind, Operation, Scope, Stamp};
