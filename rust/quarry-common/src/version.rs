//! Identifiers shared by the transactional layer and the formula cache.
//!
//! A [`StructureId`] names one versioned structure for its whole lifetime, a
//! [`Generation`] names one committed state of the whole manager. Together they
//! stamp every set read out of a versioned structure, which is what lets the
//! formula cache drop results derived from a structure once it moves on.

use std::fmt;

/// Identity of a versioned structure, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructureId(u64);

impl StructureId {
    pub const fn new(id: u64) -> StructureId {
        StructureId(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Monotonic commit counter. Generation zero is the state before any commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub const fn new(value: u64) -> Generation {
        Generation(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Receives a notification after every commit that published new versions.
///
/// Called synchronously on the committing thread, after the new generation became
/// visible and outside of any lock held by the transaction manager.
pub trait CommitObserver: Send + Sync {
    fn on_commit(&self, generation: Generation, structures: &[StructureId]);
}
