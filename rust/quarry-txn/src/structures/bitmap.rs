//! [`IntSet`] as a transactional structure.

use quarry_bitmap::IntSet;
use roaring::RoaringBitmap;

use crate::transactional::{Changes, Staged, Transactional};

/// Net inserts and removals of keys recorded by one transaction.
///
/// Every operation takes the base the transaction reads. An insert is recorded only
/// for a key the base lacks and a removal only for a key it has; the opposite
/// operation on a pending key just drops it. The two sides stay disjoint and an
/// insert followed by a remove of the same key leaves nothing behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitmapChanges {
    inserted: RoaringBitmap,
    removed: RoaringBitmap,
}

impl BitmapChanges {
    pub fn insert(&mut self, base: &IntSet, key: u32) {
        if !self.removed.remove(key) && !base.contains(key) {
            self.inserted.insert(key);
        }
    }

    pub fn remove(&mut self, base: &IntSet, key: u32) {
        if !self.inserted.remove(key) && base.contains(key) {
            self.removed.insert(key);
        }
    }

    pub fn insert_all(&mut self, base: &IntSet, keys: &IntSet) {
        let keys = keys.as_bitmap();
        let restored = &self.removed & keys;
        self.removed -= &restored;
        self.inserted |= (keys - base.as_bitmap()) - restored;
    }

    pub fn remove_all(&mut self, base: &IntSet, keys: &IntSet) {
        let keys = keys.as_bitmap();
        let dropped = &self.inserted & keys;
        self.inserted -= &dropped;
        self.removed |= (keys & base.as_bitmap()) - dropped;
    }

    pub fn inserted(&self) -> &RoaringBitmap {
        &self.inserted
    }

    pub fn removed(&self) -> &RoaringBitmap {
        &self.removed
    }

    /// Returns `true` if applying the changes to `base` would change it.
    pub fn affects(&self, base: &IntSet) -> bool {
        !self.inserted.is_subset(base.as_bitmap()) || !self.removed.is_disjoint(base.as_bitmap())
    }

    /// Returns `base` with the changes applied, or `None` if they have no effect.
    pub fn apply_to(&self, base: &IntSet) -> Option<IntSet> {
        if !self.affects(base) {
            return None;
        }
        let mut bitmap = base.as_bitmap() - &self.removed;
        bitmap |= &self.inserted;
        Some(IntSet::from_bitmap(bitmap))
    }
}

impl Changes for BitmapChanges {
    fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty()
    }
}

impl Staged<'_, IntSet> {
    pub fn insert(&mut self, key: u32) {
        let (base, changes) = self.parts();
        changes.insert(base, key);
    }

    pub fn remove(&mut self, key: u32) {
        let (base, changes) = self.parts();
        changes.remove(base, key);
    }

    pub fn insert_all(&mut self, keys: &IntSet) {
        let (base, changes) = self.parts();
        changes.insert_all(base, keys);
    }

    pub fn remove_all(&mut self, keys: &IntSet) {
        let (base, changes) = self.parts();
        changes.remove_all(base, keys);
    }
}

impl Transactional for IntSet {
    type Changes = BitmapChanges;

    fn apply(&self, changes: &BitmapChanges) -> Option<IntSet> {
        changes.apply_to(self)
    }
}
