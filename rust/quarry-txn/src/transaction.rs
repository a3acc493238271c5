use std::{fmt, sync::Arc};

use ahash::AHashMap;
use quarry_common::version::{Generation, StructureId};

use crate::{
    manager::{CommitInfo, ManagerInner},
    snapshot::Snapshot,
    transactional::Transactional,
    versioned::{Layer, PendingLayer, VersionChain},
};

/// A write transaction.
///
/// Holds one private layer of changes per structure it touched and reads every
/// structure as of the generation it began at. The handle is consumed by
/// [`commit`](Transaction::commit) or [`rollback`](Transaction::rollback); dropping
/// it without either discards the changes.
pub struct Transaction {
    id: u64,
    snapshot: Snapshot,
    layers: AHashMap<StructureId, Box<dyn PendingLayer>>,
}

impl Transaction {
    pub(crate) fn new(id: u64, snapshot: Snapshot) -> Transaction {
        Transaction {
            id,
            snapshot,
            layers: AHashMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The snapshot the transaction reads committed state from.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn base_generation(&self) -> Generation {
        self.snapshot.generation()
    }

    /// Returns `true` if any touched structure has recorded changes.
    pub fn is_dirty(&self) -> bool {
        self.layers.values().any(|layer| layer.has_changes())
    }

    /// Ids of the structures with recorded changes, ascending.
    pub fn touched(&self) -> Vec<StructureId> {
        let mut touched = self
            .layers
            .iter()
            .filter(|(_, layer)| layer.has_changes())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        touched.sort_unstable();
        touched
    }

    /// Publishes every recorded change under a new generation.
    ///
    /// Changes are applied on top of the latest committed version of each structure,
    /// not on the version the transaction read from. Structures whose changes turn
    /// out to be no-ops keep their current version.
    pub fn commit(mut self) -> CommitInfo {
        let layers = std::mem::take(&mut self.layers).into_iter().collect();
        let manager = self.manager().clone();
        manager.commit(self.id, self.base_generation(), layers)
    }

    /// Discards every recorded change.
    pub fn rollback(mut self) {
        let touched = self.touched().len();
        self.layers.clear();
        log::debug!(
            "transaction {} rolled back, {touched} structure(s) discarded",
            self.id
        );
    }

    pub(crate) fn manager(&self) -> &Arc<ManagerInner> {
        self.snapshot.manager()
    }

    pub(crate) fn changes<S: Transactional>(&self, id: StructureId) -> Option<&S::Changes> {
        let layer = self.layers.get(&id)?;
        layer
            .as_any()
            .downcast_ref::<Layer<S>>()
            .map(|layer| &layer.changes)
    }

    pub(crate) fn changes_mut<S: Transactional>(
        &mut self,
        chain: &Arc<VersionChain<S>>,
    ) -> &mut S::Changes {
        let id = chain.id();
        let layer = self
            .layers
            .entry(id)
            .or_insert_with(|| Box::new(Layer::new(chain.clone())));
        let Some(layer) = layer.as_any_mut().downcast_mut::<Layer<S>>() else {
            panic!("invariant violation: layer of structure {id} holds another structure type");
        };
        &mut layer.changes
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.layers.values().any(|layer| layer.has_changes()) {
            log::debug!(
                "transaction {} dropped without commit, changes discarded",
                self.id
            );
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("base", &self.snapshot.generation())
            .field("touched", &self.touched())
            .finish()
    }
}
