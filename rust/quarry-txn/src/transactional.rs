//! The contract between a versioned structure and its pending changes.

/// Changes recorded by one transaction against one structure.
///
/// Implementations coalesce operations against the version the transaction read,
/// so the layer holds only the net effect of the transaction: inserting something
/// the base already has, or removing something it lacks, records nothing.
pub trait Changes: Default + Send + 'static {
    /// Returns `true` if nothing has been recorded (or everything recorded has
    /// cancelled out).
    fn is_empty(&self) -> bool;
}

/// A structure that can be versioned by [`Versioned`](crate::Versioned).
///
/// Committed values are immutable; the only way to derive a new value is
/// [`apply`](Transactional::apply), which leaves `self` untouched.
pub trait Transactional: Send + Sync + 'static {
    type Changes: Changes;

    /// Builds the structure that results from applying `changes` on top of `self`.
    ///
    /// Returns `None` when the changes have no effect on `self` (every insert is
    /// already present and every removal already absent). The caller keeps `self`
    /// in that case and publishes nothing.
    fn apply(&self, changes: &Self::Changes) -> Option<Self>
    where
        Self: Sized;
}

/// A transaction's pending changes of one structure, paired with the version the
/// transaction reads them against.
///
/// Handed out by [`Versioned::mutate`](crate::Versioned::mutate). The structure
/// modules add the typed operations (`insert`, `remove`, `set`) on top of it.
pub struct Staged<'a, S: Transactional> {
    base: &'a S,
    changes: &'a mut S::Changes,
}

impl<'a, S: Transactional> Staged<'a, S> {
    pub(crate) fn new(base: &'a S, changes: &'a mut S::Changes) -> Staged<'a, S> {
        Staged { base, changes }
    }

    /// The version as of the transaction's snapshot, without its own changes.
    pub fn base(&self) -> &S {
        self.base
    }

    pub fn changes(&self) -> &S::Changes {
        self.changes
    }

    /// Splits into the base and the mutable changes, for structures whose
    /// operations are defined outside this crate.
    pub fn parts(&mut self) -> (&S, &mut S::Changes) {
        (self.base, &mut *self.changes)
    }
}
