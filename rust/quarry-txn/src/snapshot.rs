use std::{fmt, sync::Arc};

use quarry_common::version::Generation;

use crate::manager::ManagerInner;

/// A pinned, committed generation of a [`TransactionManager`](crate::TransactionManager).
///
/// While a snapshot is alive, every versioned structure of its manager keeps the
/// version that was current at its generation. Dropping the last snapshot of a
/// generation lets the next commit prune those versions.
pub struct Snapshot {
    manager: Arc<ManagerInner>,
    generation: Generation,
}

impl Snapshot {
    /// Pins the currently visible generation of `manager`.
    pub(crate) fn pin(manager: Arc<ManagerInner>) -> Snapshot {
        let generation = manager.pin_visible();
        Snapshot {
            manager,
            generation,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn manager(&self) -> &Arc<ManagerInner> {
        &self.manager
    }
}

impl Clone for Snapshot {
    fn clone(&self) -> Self {
        self.manager.pin(self.generation);
        Snapshot {
            manager: self.manager.clone(),
            generation: self.generation,
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        self.manager.unpin(self.generation);
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("manager", &self.manager.id())
            .field("generation", &self.generation)
            .finish()
    }
}
