//! Node kinds of a formula tree and their per-kind constants.

use std::fmt;

use quarry_bitmap::IntSet;
use quarry_common::version::{Generation, StructureId};

use crate::facet::FacetGroup;

/// The structure and generation a constant set was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp {
    pub structure: StructureId,
    pub generation: Generation,
}

impl Stamp {
    pub const fn new(structure: StructureId, generation: Generation) -> Stamp {
        Stamp {
            structure,
            generation,
        }
    }
}

/// Payload of a `Constant` node.
#[derive(Debug, Clone)]
pub struct Constant {
    pub set: IntSet,
    /// Where the set was read from, if it came out of a versioned structure.
    pub stamp: Option<Stamp>,
    /// Set for data that must never reach the shared cache, such as state local to
    /// an open transaction.
    pub ephemeral: bool,
}

/// Which of the two record scopes a container covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Live,
    Archived,
}

impl Scope {
    fn tag(self) -> u8 {
        match self {
            Scope::Live => 0,
            Scope::Archived => 1,
        }
    }
}

/// Kind of a formula node together with its private parameters.
#[derive(Debug, Clone)]
pub enum FormulaKind {
    Empty,
    Constant(Constant),
    And,
    Or,
    /// Children: `[subtracted, superset]`.
    Not,
    Join,
    /// Children: `[left, right]`.
    Disentangle,
    /// Children: `[and_part, or_part]`.
    CombinedFacet,
    FacetGroupAnd(FacetGroup),
    FacetGroupOr(FacetGroup),
    ScopeContainer(Scope),
    UserFilter,
}

/// Parameterless discriminant of [`FormulaKind`], used when walking trees by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Empty,
    Constant,
    And,
    Or,
    Not,
    Join,
    Disentangle,
    CombinedFacet,
    FacetGroupAnd,
    FacetGroupOr,
    ScopeContainer,
    UserFilter,
}

impl Operation {
    /// Relative cost of processing one key by this kind of node.
    pub const fn cost(self) -> u64 {
        match self {
            Operation::Empty => 0,
            Operation::Constant => 1,
            Operation::And | Operation::FacetGroupAnd | Operation::UserFilter => 11,
            Operation::Or | Operation::FacetGroupOr | Operation::ScopeContainer => 13,
            Operation::Not
            | Operation::Join
            | Operation::Disentangle
            | Operation::CombinedFacet => 15,
        }
    }

    /// Number of children the kind requires, `None` if any number is accepted.
    pub const fn arity(self) -> Option<usize> {
        match self {
            Operation::Empty
            | Operation::Constant
            | Operation::FacetGroupAnd
            | Operation::FacetGroupOr => Some(0),
            Operation::Not | Operation::Disentangle | Operation::CombinedFacet => Some(2),
            Operation::And
            | Operation::Or
            | Operation::Join
            | Operation::ScopeContainer
            | Operation::UserFilter => None,
        }
    }

    /// Whether the result does not depend on the order of the children.
    pub const fn is_commutative(self) -> bool {
        !matches!(
            self,
            Operation::Not | Operation::Disentangle | Operation::CombinedFacet
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Operation::Empty => "EMPTY",
            Operation::Constant => "CONSTANT",
            Operation::And => "AND",
            Operation::Or => "OR",
            Operation::Not => "NOT",
            Operation::Join => "JOIN",
            Operation::Disentangle => "DISENTANGLE",
            Operation::CombinedFacet => "COMBINED_FACET",
            Operation::FacetGroupAnd => "FACET_GROUP_AND",
            Operation::FacetGroupOr => "FACET_GROUP_OR",
            Operation::ScopeContainer => "SCOPE",
            Operation::UserFilter => "USER_FILTER",
        }
    }

    /// Stable tag mixed into cache keys.
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Operation::Empty => 1,
            Operation::Constant => 2,
            Operation::And => 3,
            Operation::Or => 4,
            Operation::Not => 5,
            Operation::Join => 6,
            Operation::Disentangle => 7,
            Operation::CombinedFacet => 8,
            Operation::FacetGroupAnd => 9,
            Operation::FacetGroupOr => 10,
            Operation::ScopeContainer => 11,
            Operation::UserFilter => 12,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FormulaKind {
    pub fn operation(&self) -> Operation {
        match self {
            FormulaKind::Empty => Operation::Empty,
            FormulaKind::Constant(_) => Operation::Constant,
            FormulaKind::And => Operation::And,
            FormulaKind::Or => Operation::Or,
            FormulaKind::Not => Operation::Not,
            FormulaKind::Join => Operation::Join,
            FormulaKind::Disentangle => Operation::Disentangle,
            FormulaKind::CombinedFacet => Operation::CombinedFacet,
            FormulaKind::FacetGroupAnd(_) => Operation::FacetGroupAnd,
            FormulaKind::FacetGroupOr(_) => Operation::FacetGroupOr,
            FormulaKind::ScopeContainer(_) => Operation::ScopeContainer,
            FormulaKind::UserFilter => Operation::UserFilter,
        }
    }

    /// Whether the node itself may be stored in the shared cache, not counting its
    /// children.
    pub(crate) fn is_cacheable(&self) -> bool {
        !matches!(
            self,
            FormulaKind::Constant(Constant {
                ephemeral: true,
                ..
            })
        )
    }

    /// Feeds the node's private parameters into the cache key hasher.
    pub(crate) fn hash_params(&self, hasher: &mut xxhash_rust::xxh3::Xxh3) {
        match self {
            FormulaKind::Constant(constant) => {
                hasher.update(&constant.set.content_hash().to_le_bytes());
            }
            FormulaKind::FacetGroupAnd(group) | FormulaKind::FacetGroupOr(group) => {
                group.hash_into(hasher);
            }
            FormulaKind::ScopeContainer(scope) => hasher.update(&[scope.tag()]),
            FormulaKind::Empty
            | FormulaKind::And
            | FormulaKind::Or
            | FormulaKind::Not
            | FormulaKind::Join
            | FormulaKind::Disentangle
            | FormulaKind::CombinedFacet
            | FormulaKind::UserFilter => (),
        }
    }
}
