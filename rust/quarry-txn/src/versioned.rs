//! Version chains and the [`Versioned`] cell.

use std::{
    any::Any,
    collections::VecDeque,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use quarry_common::{
    assert_invariant,
    version::{Generation, StructureId},
};

use crate::{
    manager::{ManagerInner, TransactionManager},
    snapshot::Snapshot,
    transaction::Transaction,
    transactional::{Changes, Staged, Transactional},
};

static NEXT_STRUCTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A structure with multi-version, snapshot-isolated access.
///
/// Cloning the cell is cheap and both clones refer to the same chain of versions.
pub struct Versioned<S: Transactional> {
    manager: Arc<ManagerInner>,
    chain: Arc<VersionChain<S>>,
}

impl<S: Transactional> Versioned<S> {
    /// Creates a cell whose initial content is visible to every snapshot of
    /// `manager`, including those taken before the cell existed.
    pub fn new(manager: &TransactionManager, initial: S) -> Versioned<S> {
        let id = StructureId::new(NEXT_STRUCTURE_ID.fetch_add(1, Ordering::Relaxed));
        let mut versions = VecDeque::with_capacity(2);
        versions.push_back((Generation::ZERO, Arc::new(initial)));
        Versioned {
            manager: manager.inner().clone(),
            chain: Arc::new(VersionChain {
                id,
                versions: RwLock::new(versions),
            }),
        }
    }

    pub fn id(&self) -> StructureId {
        self.chain.id
    }

    /// Latest committed version. Never waits for writers.
    pub fn read_base(&self) -> Arc<S> {
        self.chain.at(self.manager.visible()).1
    }

    /// Version as of the snapshot's generation.
    pub fn read_at(&self, snapshot: &Snapshot) -> Arc<S> {
        self.version_at(snapshot).1
    }

    /// Version as of the snapshot's generation, along with the generation that
    /// published it.
    pub fn version_at(&self, snapshot: &Snapshot) -> (Generation, Arc<S>) {
        self.check_manager(snapshot.manager(), "snapshot");
        self.chain.at(snapshot.generation())
    }

    /// The structure as seen by `tx`: its base snapshot plus its own changes.
    pub fn read(&self, tx: &Transaction) -> Arc<S> {
        let base = self.read_at(tx.snapshot());
        match tx.changes::<S>(self.id()) {
            Some(changes) if !changes.is_empty() => {
                base.apply(changes).map(Arc::new).unwrap_or(base)
            }
            _ => base,
        }
    }

    /// Records changes into the transaction's layer for this structure and returns
    /// whatever `f` returns.
    ///
    /// `f` sees the layer together with the version as of the transaction's
    /// snapshot, so operations that cancel out against it leave the layer clean.
    ///
    /// # Panics
    ///
    /// If `tx` was started by a manager other than this cell's.
    pub fn mutate<R>(
        &self,
        tx: &mut Transaction,
        f: impl FnOnce(&mut Staged<'_, S>) -> R,
    ) -> R {
        self.check_manager(tx.manager(), "transaction");
        let base = self.read_at(tx.snapshot());
        f(&mut Staged::new(&*base, tx.changes_mut(&self.chain)))
    }

    /// Returns `true` if `tx` recorded changes for this structure.
    pub fn has_changes(&self, tx: &Transaction) -> bool {
        tx.changes::<S>(self.id())
            .is_some_and(|changes| !changes.is_empty())
    }

    /// Generation that published the latest committed version.
    pub fn generation(&self) -> Generation {
        self.chain.at(self.manager.visible()).0
    }

    /// Number of versions currently kept for snapshot readers.
    pub fn retained_versions(&self) -> usize {
        self.chain.versions.read().len()
    }

    fn check_manager(&self, other: &Arc<ManagerInner>, what: &str) {
        assert_invariant!(
            Arc::ptr_eq(&self.manager, other),
            "{what} of manager {} used with structure {} of manager {}",
            other.id(),
            self.chain.id,
            self.manager.id()
        );
    }
}

impl<S: Transactional> Clone for Versioned<S> {
    fn clone(&self) -> Self {
        Versioned {
            manager: self.manager.clone(),
            chain: self.chain.clone(),
        }
    }
}

impl<S: Transactional> fmt::Debug for Versioned<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versioned")
            .field("id", &self.chain.id)
            .field("manager", &self.manager.id())
            .field("versions", &self.retained_versions())
            .finish()
    }
}

/// Committed versions of one structure, ordered by generation.
///
/// Never empty: the front version covers every generation still pinned.
pub(crate) struct VersionChain<S> {
    id: StructureId,
    versions: RwLock<VecDeque<(Generation, Arc<S>)>>,
}

impl<S: Transactional> VersionChain<S> {
    pub(crate) fn id(&self) -> StructureId {
        self.id
    }

    fn at(&self, generation: Generation) -> (Generation, Arc<S>) {
        let versions = self.versions.read();
        let end = versions.partition_point(|(published, _)| *published <= generation);
        let (published, value) = &versions[end.saturating_sub(1)];
        (*published, value.clone())
    }

    fn latest(&self) -> Arc<S> {
        let versions = self.versions.read();
        versions[versions.len() - 1].1.clone()
    }
}

/// Type-erased view of a transaction's layer, as seen by the commit path.
pub(crate) trait PendingLayer: Send {
    fn has_changes(&self) -> bool;

    /// Applies the changes on top of the latest version and appends the result under
    /// `generation`. Returns `false` if the changes had no effect.
    fn publish(&self, generation: Generation) -> bool;

    /// Drops versions no snapshot can reach anymore and returns how many remain.
    fn prune(&self, oldest_pinned: Generation) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct Layer<S: Transactional> {
    chain: Arc<VersionChain<S>>,
    pub(crate) changes: S::Changes,
}

impl<S: Transactional> Layer<S> {
    pub(crate) fn new(chain: Arc<VersionChain<S>>) -> Layer<S> {
        Layer {
            chain,
            changes: S::Changes::default(),
        }
    }
}

impl<S: Transactional> PendingLayer for Layer<S> {
    fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn publish(&self, generation: Generation) -> bool {
        // Only the committing thread appends, so `latest` cannot move underneath.
        let Some(next) = self.chain.latest().apply(&self.changes) else {
            return false;
        };
        self.chain
            .versions
            .write()
            .push_back((generation, Arc::new(next)));
        true
    }

    fn prune(&self, oldest_pinned: Generation) -> usize {
        let mut versions = self.chain.versions.write();
        let keep_from = versions
            .partition_point(|(published, _)| *published <= oldest_pinned)
            .saturating_sub(1);
        versions.drain(..keep_from);
        versions.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
