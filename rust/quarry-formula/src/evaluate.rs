//! Evaluation and the cost model.

use quarry_bitmap::IntSet;

use crate::{formula::Formula, kind::FormulaKind};

impl Formula {
    /// The set of keys this formula selects.
    ///
    /// Computed on the first call and memoized; later calls return the identical
    /// instance without recomputing.
    pub fn compute(&self) -> IntSet {
        self.0
            .result
            .get_or_init(|| {
                let result = self.evaluate();
                log::trace!(
                    "computed {} over {} children: {} keys",
                    self.operation(),
                    self.children().len(),
                    result.len()
                );
                result
            })
            .clone()
    }

    /// Cost of processing one key by this node's kind.
    pub fn operation_cost(&self) -> u64 {
        self.operation().cost()
    }

    /// Fast upper bound of the result size, computed without evaluating anything.
    pub fn estimated_cardinality(&self) -> u64 {
        *self.0.estimated_cardinality.get_or_init(|| {
            let children = self.children();
            match self.kind() {
                FormulaKind::Empty => 0,
                FormulaKind::Constant(constant) => constant.set.len(),
                FormulaKind::And | FormulaKind::UserFilter | FormulaKind::CombinedFacet => children
                    .iter()
                    .map(Formula::estimated_cardinality)
                    .min()
                    .unwrap_or(0),
                FormulaKind::Or | FormulaKind::Join | FormulaKind::ScopeContainer(_) => children
                    .iter()
                    .map(Formula::estimated_cardinality)
                    .fold(0u64, u64::saturating_add),
                FormulaKind::Not => children[1].estimated_cardinality(),
                FormulaKind::Disentangle => children[0].estimated_cardinality(),
                FormulaKind::FacetGroupAnd(group) => group.min_len(),
                FormulaKind::FacetGroupOr(group) => group.total_len(),
            }
        })
    }

    /// Estimated price of computing this formula, children included.
    pub fn estimated_cost(&self) -> u64 {
        *self.0.estimated_cost.get_or_init(|| {
            self.children()
                .iter()
                .map(Formula::estimated_cost)
                .fold(0u64, u64::saturating_add)
                .saturating_add(
                    self.estimated_cardinality()
                        .saturating_mul(self.operation_cost()),
                )
        })
    }

    /// Actual price of computing this formula, children included. Evaluates the tree
    /// on the first call and is memoized; a node substituted from the cache reports
    /// the cost recorded when its result was admitted.
    pub fn cost(&self) -> u64 {
        *self.0.cost.get_or_init(|| {
            self.children()
                .iter()
                .map(Formula::cost)
                .fold(0u64, u64::saturating_add)
                .saturating_add(self.compute().len().saturating_mul(self.operation_cost()))
        })
    }

    /// Price paid per key of the result; the higher, the more a cached result saves.
    pub fn cost_to_performance(&self) -> u64 {
        self.cost() / self.compute().len().max(1)
    }

    fn evaluate(&self) -> IntSet {
        let children = self.children();
        match self.kind() {
            FormulaKind::Empty => IntSet::empty(),
            FormulaKind::Constant(constant) => constant.set.clone(),
            FormulaKind::And | FormulaKind::UserFilter => intersect_cheapest_first(children),
            FormulaKind::Or | FormulaKind::Join | FormulaKind::ScopeContainer(_) => {
                IntSet::union_all(children.iter().map(Formula::compute).collect::<Vec<_>>().iter())
            }
            FormulaKind::Not => {
                let superset = children[1].compute();
                if superset.is_empty() {
                    return superset;
                }
                superset.difference(&children[0].compute())
            }
            FormulaKind::Disentangle => disentangle(&children[0], &children[1]),
            FormulaKind::CombinedFacet => intersect_cheapest_first(children),
            FormulaKind::FacetGroupAnd(group) => group.intersection(),
            FormulaKind::FacetGroupOr(group) => group.union(),
        }
    }
}

/// Intersects the children in ascending estimated cost, stopping at the first empty
/// intermediate result.
fn intersect_cheapest_first(children: &[Formula]) -> IntSet {
    if children.is_empty() {
        return IntSet::empty();
    }
    let mut ordered = children.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|child| child.estimated_cost());

    let mut result = ordered[0].compute();
    for child in &ordered[1..] {
        if result.is_empty() {
            break;
        }
        result = result.intersect(&child.compute());
    }
    result
}

/// The sets a formula contributes to a multiset count: one per child for a `Join`,
/// its own result otherwise.
fn occurrences(formula: &Formula) -> Vec<IntSet> {
    match formula.kind() {
        FormulaKind::Join => formula.children().iter().map(Formula::compute).collect(),
        _ => vec![formula.compute()],
    }
}

/// Keys that occur more often in `left` than in `right`.
fn disentangle(left: &Formula, right: &Formula) -> IntSet {
    let left = occurrences(left);
    let left_union = IntSet::union_all(&left);
    if left_union.is_empty() {
        return left_union;
    }
    let right = occurrences(right);
    let right_union = IntSet::union_all(&right);

    let exclusive = left_union.difference(&right_union);
    if left.len() == 1 && right.len() == 1 {
        return exclusive;
    }

    let shared = left_union.intersect(&right_union);
    let count = |sets: &[IntSet], key: u32| sets.iter().filter(|set| set.contains(key)).count();
    let surplus = shared
        .iter()
        .filter(|&key| count(&left, key) > count(&right, key))
        .collect::<IntSet>();
    exclusive.union(&surplus)
}
