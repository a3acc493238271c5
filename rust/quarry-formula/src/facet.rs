//! Facet group payloads and their merging.

use std::{collections::BTreeMap, sync::Arc};

use quarry_bitmap::IntSet;
use quarry_common::{Result, error::Error, verify_invariant};

use crate::{formula::Formula, kind::FormulaKind};

/// Per-facet bitmaps of one facet group of one reference.
///
/// Used by the facet AND-group and OR-group formulas, which respectively intersect
/// and unite the bitmaps of all facets in the group.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGroup {
    reference_name: Arc<str>,
    group_id: Option<u32>,
    facets: BTreeMap<u32, IntSet>,
}

impl FacetGroup {
    pub fn new(reference_name: impl Into<Arc<str>>, group_id: Option<u32>) -> FacetGroup {
        FacetGroup {
            reference_name: reference_name.into(),
            group_id,
            facets: BTreeMap::new(),
        }
    }

    pub fn from_facets(
        reference_name: impl Into<Arc<str>>,
        group_id: Option<u32>,
        facets: impl IntoIterator<Item = (u32, IntSet)>,
    ) -> FacetGroup {
        facets
            .into_iter()
            .fold(FacetGroup::new(reference_name, group_id), |group, (id, set)| {
                group.with_facet(id, set)
            })
    }

    /// Adds the keys of `facet_id`, uniting them with keys already present.
    pub fn with_facet(mut self, facet_id: u32, set: IntSet) -> FacetGroup {
        let merged = match self.facets.get(&facet_id) {
            Some(existing) => existing.union(&set),
            None => set,
        };
        self.facets.insert(facet_id, merged);
        self
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    pub fn group_id(&self) -> Option<u32> {
        self.group_id
    }

    pub fn facets(&self) -> &BTreeMap<u32, IntSet> {
        &self.facets
    }

    pub fn facet_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.facets.keys().copied()
    }

    /// Unites two groups facet by facet.
    ///
    /// Both groups must belong to the same reference and the same group id.
    pub fn merge(&self, other: &FacetGroup) -> Result<FacetGroup> {
        verify_invariant!(
            self.group_id == other.group_id,
            "cannot merge facet group {:?} with {:?}",
            self.group_id,
            other.group_id
        );
        verify_invariant!(
            self.reference_name == other.reference_name,
            "cannot merge facets of reference '{}' with '{}'",
            self.reference_name,
            other.reference_name
        );
        let mut merged = self.clone();
        for (id, set) in &other.facets {
            merged = merged.with_facet(*id, set.clone());
        }
        Ok(merged)
    }

    pub(crate) fn intersection(&self) -> IntSet {
        IntSet::intersect_all(self.facets.values())
    }

    pub(crate) fn union(&self) -> IntSet {
        IntSet::union_all(self.facets.values())
    }

    pub(crate) fn min_len(&self) -> u64 {
        self.facets.values().map(IntSet::len).min().unwrap_or(0)
    }

    pub(crate) fn total_len(&self) -> u64 {
        self.facets.values().map(IntSet::len).sum()
    }

    pub(crate) fn hash_into(&self, hasher: &mut xxhash_rust::xxh3::Xxh3) {
        hasher.update(&(self.reference_name.len() as u64).to_le_bytes());
        hasher.update(self.reference_name.as_bytes());
        match self.group_id {
            Some(id) => {
                hasher.update(&[1]);
                hasher.update(&id.to_le_bytes());
            }
            None => hasher.update(&[0]),
        }
        for (id, set) in &self.facets {
            hasher.update(&id.to_le_bytes());
            hasher.update(&set.content_hash().to_le_bytes());
        }
    }
}

impl Formula {
    /// Merges two facet group formulas of the same kind into one.
    ///
    /// Fails with an invariant violation when the kinds, the group ids or the
    /// reference names differ.
    pub fn merge_with(&self, other: &Formula) -> Result<Formula> {
        match (self.kind(), other.kind()) {
            (FormulaKind::FacetGroupAnd(a), FormulaKind::FacetGroupAnd(b)) => {
                Ok(Formula::facet_group_and(a.merge(b)?))
            }
            (FormulaKind::FacetGroupOr(a), FormulaKind::FacetGroupOr(b)) => {
                Ok(Formula::facet_group_or(a.merge(b)?))
            }
            _ => Err(Error::invariant_violation(format!(
                "cannot merge {} with {}",
                self.operation(),
                other.operation()
            ))),
        }
    }
}
