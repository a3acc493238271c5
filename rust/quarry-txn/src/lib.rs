//! Multi-version overlays for in-memory index structures.
//!
//! A [`TransactionManager`] hands out [`Transaction`]s and [`Snapshot`]s. Every
//! index structure that must be mutated under transactions is wrapped in a
//! [`Versioned`] cell created against one manager:
//!
//! - Readers take a snapshot and read each structure as of its generation. A
//!   snapshot sees either all of a commit or none of it.
//! - Writers record changes into the transaction's private layer for each structure
//!   they touch. Nobody else sees those changes.
//! - `commit` applies every layer to the latest committed version, publishes the
//!   results under a new generation and only then makes the generation visible.
//!   Earlier versions stay readable while some snapshot still pins them.
//!
//! The committed structure (`Arc<S>`) and the pending layer (`S::Changes`) are
//! different types, so a published version cannot be modified in place.

pub mod manager;
pub mod snapshot;
pub mod structures;
pub mod transaction;
pub mod transactional;
pub mod versioned;

#[cfg(test)]
mod tests;

pub use manager::{CommitInfo, TransactionManager, TransactionManagerConfig};
pub use quarry_common::version::{CommitObserver, Generation, StructureId};
pub use snapshot::Snapshot;
pub use structures::{
    bitmap::BitmapChanges,
    flag::{Flag, FlagChanges},
    sorted_array::{SortedArray, SortedArrayChanges},
};
pub use transaction::Transaction;
pub use transactional::{Changes, Staged, Transactional};
pub use versioned::Versioned;
