//! The formula node and its constructors.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use quarry_bitmap::IntSet;
use quarry_common::{Result, error::Error};

use crate::{
    facet::FacetGroup,
    kind::{Constant, FormulaKind, Operation, Scope, Stamp},
};

/// A node of an immutable formula tree. Cloning shares the node.
#[derive(Clone)]
pub struct Formula(pub(crate) Arc<FormulaNode>);

pub(crate) struct FormulaNode {
    pub(crate) kind: FormulaKind,
    pub(crate) children: Vec<Formula>,
    /// False if this node or any descendant carries ephemeral data.
    pub(crate) cacheable: bool,
    pub(crate) result: OnceLock<IntSet>,
    pub(crate) estimated_cardinality: OnceLock<u64>,
    pub(crate) estimated_cost: OnceLock<u64>,
    pub(crate) cost: OnceLock<u64>,
    pub(crate) cache_key: OnceLock<u64>,
}

impl Formula {
    fn build(kind: FormulaKind, children: Vec<Formula>) -> Formula {
        let cacheable = kind.is_cacheable() && children.iter().all(Formula::is_cacheable);
        Formula(Arc::new(FormulaNode {
            kind,
            children,
            cacheable,
            result: OnceLock::new(),
            estimated_cardinality: OnceLock::new(),
            estimated_cost: OnceLock::new(),
            cost: OnceLock::new(),
            cache_key: OnceLock::new(),
        }))
    }

    /// The shared empty formula.
    pub fn empty() -> Formula {
        static EMPTY: OnceLock<Formula> = OnceLock::new();
        EMPTY
            .get_or_init(|| Formula::build(FormulaKind::Empty, Vec::new()))
            .clone()
    }

    pub fn constant(set: IntSet) -> Formula {
        Formula::build(
            FormulaKind::Constant(Constant {
                set,
                stamp: None,
                ephemeral: false,
            }),
            Vec::new(),
        )
    }

    /// A constant read out of a versioned structure at a given generation.
    pub fn stamped(set: IntSet, stamp: Stamp) -> Formula {
        Formula::build(
            FormulaKind::Constant(Constant {
                set,
                stamp: Some(stamp),
                ephemeral: false,
            }),
            Vec::new(),
        )
    }

    /// A constant that, along with every formula containing it, stays out of the
    /// shared cache.
    pub fn ephemeral(set: IntSet) -> Formula {
        Formula::build(
            FormulaKind::Constant(Constant {
                set,
                stamp: None,
                ephemeral: true,
            }),
            Vec::new(),
        )
    }

    pub fn and(children: Vec<Formula>) -> Formula {
        Formula::build(FormulaKind::And, children)
    }

    pub fn or(children: Vec<Formula>) -> Formula {
        Formula::build(FormulaKind::Or, children)
    }

    pub fn join(children: Vec<Formula>) -> Formula {
        Formula::build(FormulaKind::Join, children)
    }

    /// `superset \ subtracted`.
    pub fn not(subtracted: Formula, superset: Formula) -> Formula {
        Formula::build(FormulaKind::Not, vec![subtracted, superset])
    }

    pub fn disentangle(left: Formula, right: Formula) -> Formula {
        Formula::build(FormulaKind::Disentangle, vec![left, right])
    }

    pub fn combined_facet(and_part: Formula, or_part: Formula) -> Formula {
        Formula::build(FormulaKind::CombinedFacet, vec![and_part, or_part])
    }

    pub fn facet_group_and(group: FacetGroup) -> Formula {
        Formula::build(FormulaKind::FacetGroupAnd(group), Vec::new())
    }

    pub fn facet_group_or(group: FacetGroup) -> Formula {
        Formula::build(FormulaKind::FacetGroupOr(group), Vec::new())
    }

    pub fn scope_container(scope: Scope, children: Vec<Formula>) -> Formula {
        Formula::build(FormulaKind::ScopeContainer(scope), children)
    }

    pub fn user_filter(children: Vec<Formula>) -> Formula {
        Formula::build(FormulaKind::UserFilter, children)
    }

    pub fn kind(&self) -> &FormulaKind {
        &self.0.kind
    }

    pub fn operation(&self) -> Operation {
        self.0.kind.operation()
    }

    pub fn children(&self) -> &[Formula] {
        &self.0.children
    }

    /// Whether the node and all of its descendants may be stored in the shared cache.
    pub fn is_cacheable(&self) -> bool {
        self.0.cacheable
    }

    /// Whether [`compute`](Formula::compute) has already produced the result.
    pub fn is_computed(&self) -> bool {
        self.0.result.get().is_some()
    }

    pub(crate) fn computed_result(&self) -> Option<&IntSet> {
        self.0.result.get()
    }

    /// Returns `true` if both handles point to the same node.
    pub fn ptr_eq(a: &Formula, b: &Formula) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Creates a node of the same kind and parameters over different children.
    ///
    /// Fails with `InvalidStructure` if the kind has a fixed arity and
    /// `children` does not match it.
    pub fn with_children(&self, children: Vec<Formula>) -> Result<Formula> {
        let operation = self.operation();
        if let Some(arity) = operation.arity() {
            if children.len() != arity {
                return Err(Error::invalid_structure(
                    operation.name(),
                    format!("expected {arity} children, got {}", children.len()),
                ));
            }
        }
        if matches!(self.0.kind, FormulaKind::Empty) {
            return Ok(Formula::empty());
        }
        Ok(Formula::build(self.0.kind.clone(), children))
    }

    /// Creates a copy of this node (same kind and children) whose result and actual
    /// cost are already known.
    pub(crate) fn with_result(&self, result: IntSet, cost: u64) -> Formula {
        let formula = Formula::build(self.0.kind.clone(), self.0.children.clone());
        let _ = formula.0.result.set(result);
        let _ = formula.0.cost.set(cost);
        formula
    }

    /// Constant payload, if this is a `Constant` node.
    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.0.kind {
            FormulaKind::Constant(constant) => Some(constant),
            _ => None,
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Prints the tree, one node per line, children indented below their parent.
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(formula: &Formula, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:indent$}{}", "", formula.operation(), indent = depth * 3)?;
            match formula.kind() {
                FormulaKind::Constant(constant) => write!(f, " {:?}", constant.set)?,
                FormulaKind::FacetGroupAnd(group) | FormulaKind::FacetGroupOr(group) => write!(
                    f,
                    " {}:{:?} facets {:?}",
                    group.reference_name(),
                    group.group_id(),
                    group.facet_ids().collect::<Vec<_>>()
                )?,
                FormulaKind::ScopeContainer(scope) => write!(f, " {scope:?}")?,
                _ => (),
            }
            writeln!(f)?;
            for child in formula.children() {
                write_node(child, depth + 1, f)?;
            }
            Ok(())
        }
        write_node(self, 0, f)
    }
}
