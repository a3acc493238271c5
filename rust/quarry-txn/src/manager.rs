//! Transaction manager: generation counter, commit serialization and snapshot pins.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use quarry_common::{
    Result,
    version::{CommitObserver, Generation, StructureId},
    verify_arg,
};

use crate::{snapshot::Snapshot, transaction::Transaction, versioned::PendingLayer};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration of a [`TransactionManager`].
#[derive(Debug, Clone)]
pub struct TransactionManagerConfig {
    /// Number of versions a single structure may retain for pinned snapshots before
    /// each commit starts warning about long-lived readers.
    pub stale_chain_warn_len: usize,
}

impl Default for TransactionManagerConfig {
    fn default() -> Self {
        Self {
            stale_chain_warn_len: 64,
        }
    }
}

impl TransactionManagerConfig {
    pub fn validate(&self) -> Result<()> {
        verify_arg!(stale_chain_warn_len, self.stale_chain_warn_len >= 2);
        Ok(())
    }
}

/// Outcome of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The generation visible right after the commit. Equals the previous
    /// generation when nothing was published.
    pub generation: Generation,
    /// Structures that received a new version, in ascending id order.
    pub published: Vec<StructureId>,
}

impl CommitInfo {
    /// Returns `true` if the commit made no observable change.
    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}

/// Entry point of the transactional layer. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TransactionManager {
    inner: Arc<ManagerInner>,
}

impl TransactionManager {
    pub fn new() -> TransactionManager {
        Self::from_inner(TransactionManagerConfig::default())
    }

    pub fn with_config(config: TransactionManagerConfig) -> Result<TransactionManager> {
        config.validate()?;
        Ok(Self::from_inner(config))
    }

    fn from_inner(config: TransactionManagerConfig) -> TransactionManager {
        TransactionManager {
            inner: Arc::new(ManagerInner {
                id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
                config,
                visible: AtomicU64::new(0),
                next_tx_id: AtomicU64::new(1),
                commit_lock: Mutex::new(()),
                pins: Mutex::new(BTreeMap::new()),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Starts a transaction reading from the currently visible generation.
    pub fn begin(&self) -> Transaction {
        let id = self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed);
        let snapshot = Snapshot::pin(self.inner.clone());
        log::trace!(
            "begin transaction {id} at {} (manager {})",
            snapshot.generation(),
            self.inner.id
        );
        Transaction::new(id, snapshot)
    }

    /// Pins the currently visible generation for reading.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::pin(self.inner.clone())
    }

    pub fn visible_generation(&self) -> Generation {
        self.inner.visible()
    }

    /// Registers an observer notified after every commit that published something.
    pub fn add_observer(&self, observer: Arc<dyn CommitObserver>) {
        self.inner.observers.write().push(observer);
    }

    /// Number of live snapshots, transactions included.
    pub fn pinned_snapshot_count(&self) -> usize {
        self.inner.pins.lock().values().sum()
    }

    pub fn config(&self) -> &TransactionManagerConfig {
        &self.inner.config
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn inner(&self) -> &Arc<ManagerInner> {
        &self.inner
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("id", &self.inner.id)
            .field("visible", &self.inner.visible())
            .finish()
    }
}

pub(crate) struct ManagerInner {
    id: u64,
    config: TransactionManagerConfig,
    visible: AtomicU64,
    next_tx_id: AtomicU64,
    commit_lock: Mutex<()>,
    /// Live snapshot count per pinned generation.
    pins: Mutex<BTreeMap<Generation, usize>>,
    observers: RwLock<Vec<Arc<dyn CommitObserver>>>,
}

impl ManagerInner {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn visible(&self) -> Generation {
        Generation::new(self.visible.load(Ordering::Acquire))
    }

    /// Reads the visible generation and pins it in one step, so that a concurrent
    /// commit either sees the pin or has already made its generation visible.
    pub(crate) fn pin_visible(&self) -> Generation {
        let mut pins = self.pins.lock();
        let generation = self.visible();
        *pins.entry(generation).or_default() += 1;
        generation
    }

    pub(crate) fn pin(&self, generation: Generation) {
        *self.pins.lock().entry(generation).or_default() += 1;
    }

    pub(crate) fn unpin(&self, generation: Generation) {
        let mut pins = self.pins.lock();
        if let Some(count) = pins.get_mut(&generation) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&generation);
            }
        }
    }

    /// Oldest pinned generation, not counting one pin of `own` (the committing
    /// transaction's, released right after the commit).
    fn oldest_pinned_excluding(&self, own: Generation) -> Option<Generation> {
        self.pins
            .lock()
            .iter()
            .find(|&(pinned, count)| *count > usize::from(*pinned == own))
            .map(|(pinned, _)| *pinned)
    }

    /// Publishes the given layers under a new generation.
    ///
    /// Every new version is pushed before the generation becomes visible; readers
    /// resolve versions by generation, so a reader observes the whole commit or
    /// nothing of it.
    pub(crate) fn commit(
        &self,
        tx_id: u64,
        base: Generation,
        mut layers: Vec<(StructureId, Box<dyn PendingLayer>)>,
    ) -> CommitInfo {
        layers.retain(|(_, layer)| layer.has_changes());
        layers.sort_unstable_by_key(|(id, _)| *id);

        let (generation, published) = {
            let _guard = self.commit_lock.lock();
            let generation = self.visible().next();

            let published = layers
                .iter()
                .filter(|(_, layer)| layer.publish(generation))
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            if published.is_empty() {
                log::debug!("transaction {tx_id} committed without effective changes");
                return CommitInfo {
                    generation: self.visible(),
                    published,
                };
            }

            self.visible.store(generation.as_u64(), Ordering::Release);

            let oldest_pinned = self.oldest_pinned_excluding(base).unwrap_or(generation);
            for (id, layer) in &layers {
                let retained = layer.prune(oldest_pinned);
                if retained > self.config.stale_chain_warn_len {
                    log::warn!(
                        "structure {id} retains {retained} versions, oldest pinned snapshot is at {oldest_pinned}"
                    );
                }
            }
            (generation, published)
        };

        log::debug!(
            "transaction {tx_id} committed {} structure(s) at {generation}",
            published.len()
        );

        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_commit(generation, &published);
        }

        CommitInfo {
            generation,
            published,
        }
    }
}
