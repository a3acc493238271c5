//! Immutable, shared, compressed set of `u32` primary keys.
//!
//! IntSet models a set S ⊆ [0, 2^32) of entity primary keys. It is a value type: every
//! operation returns a new set and leaves its inputs untouched, so a set handed out to
//! one reader can never change under it.
//!
//! Representation
//! - The keys are held in a [`RoaringBitmap`], which adaptively chooses array, bitmap
//!   or run containers per 2^16 chunk of the key space.
//! - The bitmap lives behind an `Arc`; cloning an IntSet is O(1) and two clones are
//!   [`ptr_eq`](IntSet::ptr_eq). Memoizing layers use that to hand out the *identical*
//!   instance on repeated requests.
//! - All empty results collapse into one shared empty instance, so emptiness is an O(1)
//!   check and empty sets never allocate.
//!
//! Key properties and invariants
//! - Iteration is strictly ascending, without duplicates.
//! - Equality is by content; identity is available through `ptr_eq`.
//! - The content hash is computed lazily, once per instance, and is stable across
//!   processes (xxh3 with a fixed seed).

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use roaring::RoaringBitmap;

/// Seed of the xxh3 content hash ("QrySet01" in hex).
const INT_SET_HASH_SEED: u64 = 0x5172_7953_6574_3031;

/// Number of elements printed by the `Debug` implementation before eliding the rest.
const DEBUG_PREVIEW_LEN: usize = 16;

/// An immutable, cheaply cloneable set of `u32` keys with ascending iteration.
#[derive(Clone)]
pub struct IntSet(Arc<Inner>);

struct Inner {
    bitmap: RoaringBitmap,
    content_hash: OnceLock<u64>,
}

impl IntSet {
    /// Returns the shared empty set.
    ///
    /// Every empty result produced by this type is this very instance.
    pub fn empty() -> IntSet {
        static EMPTY: OnceLock<IntSet> = OnceLock::new();
        EMPTY
            .get_or_init(|| IntSet::wrap(RoaringBitmap::new()))
            .clone()
    }

    /// Creates a set containing exactly one key.
    pub fn singleton(key: u32) -> IntSet {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert(key);
        IntSet::wrap(bitmap)
    }

    /// Creates a set from an already built bitmap.
    pub fn from_bitmap(bitmap: RoaringBitmap) -> IntSet {
        if bitmap.is_empty() {
            IntSet::empty()
        } else {
            IntSet::wrap(bitmap)
        }
    }

    /// Creates a set from keys in any order; duplicates are dropped.
    pub fn from_keys(keys: impl IntoIterator<Item = u32>) -> IntSet {
        IntSet::from_bitmap(keys.into_iter().collect())
    }

    fn wrap(bitmap: RoaringBitmap) -> IntSet {
        IntSet(Arc::new(Inner {
            bitmap,
            content_hash: OnceLock::new(),
        }))
    }

    /// Returns `true` if the set holds no keys. O(1).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.bitmap.is_empty()
    }

    /// Number of keys in the set.
    #[inline]
    pub fn len(&self) -> u64 {
        self.0.bitmap.len()
    }

    /// Test membership of `key`.
    #[inline]
    pub fn contains(&self, key: u32) -> bool {
        self.0.bitmap.contains(key)
    }

    /// Smallest key, if any.
    pub fn min(&self) -> Option<u32> {
        self.0.bitmap.min()
    }

    /// Largest key, if any.
    pub fn max(&self) -> Option<u32> {
        self.0.bitmap.max()
    }

    /// Iterates the keys in ascending order.
    pub fn iter(&self) -> roaring::bitmap::Iter<'_> {
        self.0.bitmap.iter()
    }

    /// Collects the keys into a vector, ascending.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Read access to the underlying bitmap.
    pub fn as_bitmap(&self) -> &RoaringBitmap {
        &self.0.bitmap
    }

    /// Returns `true` if both handles point to the same instance.
    #[inline]
    pub fn ptr_eq(a: &IntSet, b: &IntSet) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns `true` if every key of `self` is also in `other`.
    pub fn is_subset(&self, other: &IntSet) -> bool {
        self.0.bitmap.is_subset(&other.0.bitmap)
    }

    /// Union of two sets.
    ///
    /// When one side is empty the other side is returned as is (same instance).
    pub fn union(&self, other: &IntSet) -> IntSet {
        if other.is_empty() {
            self.clone()
        } else if self.is_empty() {
            other.clone()
        } else {
            IntSet::wrap(&self.0.bitmap | &other.0.bitmap)
        }
    }

    /// Intersection of two sets.
    pub fn intersect(&self, other: &IntSet) -> IntSet {
        if self.is_empty() || other.is_empty() {
            IntSet::empty()
        } else {
            IntSet::from_bitmap(&self.0.bitmap & &other.0.bitmap)
        }
    }

    /// Keys of `self` that are not in `other`.
    pub fn difference(&self, other: &IntSet) -> IntSet {
        if self.is_empty() {
            IntSet::empty()
        } else if other.is_empty() {
            self.clone()
        } else {
            IntSet::from_bitmap(&self.0.bitmap - &other.0.bitmap)
        }
    }

    /// Union of any number of sets.
    ///
    /// Empty inputs are skipped; a single non-empty input is returned as is.
    pub fn union_all<'a>(sets: impl IntoIterator<Item = &'a IntSet>) -> IntSet {
        let mut non_empty = sets.into_iter().filter(|set| !set.is_empty());
        let Some(first) = non_empty.next() else {
            return IntSet::empty();
        };
        let Some(second) = non_empty.next() else {
            return first.clone();
        };
        let mut bitmap = &first.0.bitmap | &second.0.bitmap;
        for set in non_empty {
            bitmap |= &set.0.bitmap;
        }
        IntSet::wrap(bitmap)
    }

    /// Intersection of any number of sets.
    ///
    /// Returns the empty set for no inputs: the engine has no implicit universe.
    /// Stops early as soon as the running intersection becomes empty.
    pub fn intersect_all<'a>(sets: impl IntoIterator<Item = &'a IntSet>) -> IntSet {
        let mut sets = sets.into_iter();
        let Some(first) = sets.next() else {
            return IntSet::empty();
        };
        let mut bitmap: Option<RoaringBitmap> = None;
        for set in sets {
            let current = bitmap.as_ref().unwrap_or(&first.0.bitmap);
            let next = current & &set.0.bitmap;
            if next.is_empty() {
                return IntSet::empty();
            }
            bitmap = Some(next);
        }
        match bitmap {
            Some(bitmap) => IntSet::from_bitmap(bitmap),
            None => first.clone(),
        }
    }

    /// Stable content hash of the set, computed once per instance.
    ///
    /// Two sets with equal content always have equal hashes, regardless of how they
    /// were built.
    pub fn content_hash(&self) -> u64 {
        *self.0.content_hash.get_or_init(|| {
            let mut hasher = xxhash_rust::xxh3::Xxh3::with_seed(INT_SET_HASH_SEED);
            hasher.update(&self.len().to_le_bytes());
            for key in self.iter() {
                hasher.update(&key.to_le_bytes());
            }
            hasher.digest()
        })
    }
}

impl Default for IntSet {
    fn default() -> Self {
        IntSet::empty()
    }
}

impl PartialEq for IntSet {
    fn eq(&self, other: &Self) -> bool {
        IntSet::ptr_eq(self, other) || self.0.bitmap == other.0.bitmap
    }
}

impl Eq for IntSet {}

impl Hash for IntSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl fmt::Debug for IntSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.len();
        let mut list = f.debug_list();
        list.entries(self.iter().take(DEBUG_PREVIEW_LEN));
        if len > DEBUG_PREVIEW_LEN as u64 {
            list.entry(&format_args!("... {} more", len - DEBUG_PREVIEW_LEN as u64));
        }
        list.finish()
    }
}

impl From<RoaringBitmap> for IntSet {
    fn from(bitmap: RoaringBitmap) -> Self {
        IntSet::from_bitmap(bitmap)
    }
}

impl FromIterator<u32> for IntSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        IntSet::from_keys(iter)
    }
}

impl<'a> IntoIterator for &'a IntSet {
    type Item = u32;
    type IntoIter = roaring::bitmap::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
