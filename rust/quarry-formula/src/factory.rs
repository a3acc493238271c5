//! Constructors that avoid building trivial nodes.
//!
//! Range and facet producers assemble formulas from a variable number of inputs,
//! often zero or one. These helpers keep the resulting trees minimal: no input
//! becomes [`Formula::empty`], a single input is returned as is.

use quarry_bitmap::IntSet;

use crate::{
    formula::Formula,
    kind::{FormulaKind, Operation},
};

fn is_empty(formula: &Formula) -> bool {
    formula.operation() == Operation::Empty
}

/// Wraps each non-empty set into a constant formula.
pub fn constants(sets: impl IntoIterator<Item = IntSet>) -> Vec<Formula> {
    sets.into_iter()
        .filter(|set| !set.is_empty())
        .map(Formula::constant)
        .collect()
}

/// `Or` of the non-empty inputs.
pub fn or_if_necessary(children: Vec<Formula>) -> Formula {
    let mut children = children
        .into_iter()
        .filter(|child| !is_empty(child))
        .collect::<Vec<_>>();
    match children.len() {
        0 => Formula::empty(),
        1 => children.swap_remove(0),
        _ => Formula::or(children),
    }
}

/// `Join` of the non-empty inputs. A single input needs no duplicate tracking and
/// is returned as is.
pub fn join_if_necessary(children: Vec<Formula>) -> Formula {
    let mut children = children
        .into_iter()
        .filter(|child| !is_empty(child))
        .collect::<Vec<_>>();
    match children.len() {
        0 => Formula::empty(),
        1 => children.swap_remove(0),
        _ => Formula::join(children),
    }
}

/// `And` of the inputs; any empty input makes the whole intersection empty.
pub fn and_if_necessary(children: Vec<Formula>) -> Formula {
    if children.is_empty() || children.iter().any(is_empty) {
        return Formula::empty();
    }
    let mut children = children;
    match children.len() {
        1 => children.swap_remove(0),
        _ => Formula::and(children),
    }
}

/// `Not(subtracted, superset)` unless one side makes it trivial.
pub fn not_if_necessary(subtracted: Formula, superset: Formula) -> Formula {
    if is_empty(&superset) {
        Formula::empty()
    } else if is_empty(&subtracted) {
        superset
    } else {
        Formula::not(subtracted, superset)
    }
}

/// `Disentangle(left, right)` unless one side makes it trivial.
///
/// With nothing on the right, the duplicate counts of a left `Join` no longer matter
/// and it is turned into a plain `Or` over the same children.
pub fn disentangle_if_necessary(left: Formula, right: Formula) -> Formula {
    if is_empty(&left) {
        Formula::empty()
    } else if is_empty(&right) {
        match left.kind() {
            FormulaKind::Join => Formula::or(left.children().to_vec()),
            _ => left,
        }
    } else {
        Formula::disentangle(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsing_shapes() {
        let a = Formula::constant(IntSet::from_keys([1, 2]));
        let b = Formula::constant(IntSet::from_keys([2, 3]));

        assert_eq!(or_if_necessary(vec![]).operation(), Operation::Empty);
        assert!(Formula::ptr_eq(&or_if_necessary(vec![a.clone(), Formula::empty()]), &a));
        assert_eq!(
            join_if_necessary(vec![a.clone(), b.clone()]).operation(),
            Operation::Join
        );
        assert_eq!(
            and_if_necessary(vec![a.clone(), Formula::empty()]).operation(),
            Operation::Empty
        );
        assert!(Formula::ptr_eq(&not_if_necessary(Formula::empty(), b.clone()), &b));
        assert_eq!(constants([IntSet::empty(), IntSet::singleton(1)]).len(), 1);
    }

    #[test]
    fn test_disentangle_without_right_becomes_or() {
        let join = Formula::join(vec![
            Formula::constant(IntSet::from_keys([1, 2])),
            Formula::constant(IntSet::from_keys([2, 3])),
        ]);
        let formula = disentangle_if_necessary(join, Formula::empty());
        assert_eq!(formula.operation(), Operation::Or);
        assert_eq!(formula.compute().to_vec(), vec![1, 2, 3]);

        assert_eq!(
            disentangle_if_necessary(Formula::empty(), Formula::constant(IntSet::singleton(1)))
                .operation(),
            Operation::Empty
        );
    }
}
