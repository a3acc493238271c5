//! Tree traversal and rewriting.

use quarry_common::Result;

use crate::{
    formula::Formula,
    kind::{FormulaKind, Operation, Stamp},
};

impl Formula {
    /// Calls `f` for every node of the tree in pre-order.
    pub fn visit(&self, f: &mut impl FnMut(&Formula)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Every node of the tree matching `predicate`, in pre-order.
    pub fn find_all(&self, mut predicate: impl FnMut(&Formula) -> bool) -> Vec<Formula> {
        let mut found = Vec::new();
        self.visit(&mut |formula| {
            if predicate(formula) {
                found.push(formula.clone());
            }
        });
        found
    }

    /// Every node of the given kind, in pre-order.
    pub fn find_all_of(&self, operation: Operation) -> Vec<Formula> {
        self.find_all(|formula| formula.operation() == operation)
    }

    /// Rebuilds the tree bottom-up where `replace` asks for it.
    ///
    /// `replace` is called for each node before its children. A returned formula takes
    /// the place of the whole subtree. Otherwise the children are rewritten and the
    /// node is re-created only if one of them changed, so untouched subtrees keep their
    /// identity and their memoized results.
    pub fn rewrite(&self, replace: &mut impl FnMut(&Formula) -> Option<Formula>) -> Result<Formula> {
        if let Some(replacement) = replace(self) {
            return Ok(replacement);
        }
        let mut changed = false;
        let mut children = Vec::with_capacity(self.children().len());
        for child in self.children() {
            let rewritten = child.rewrite(replace)?;
            changed |= !Formula::ptr_eq(child, &rewritten);
            children.push(rewritten);
        }
        if changed {
            self.with_children(children)
        } else {
            Ok(self.clone())
        }
    }

    /// Stamps of all versioned structures the formula reads, sorted and deduplicated.
    pub fn dependencies(&self) -> Vec<Stamp> {
        let mut stamps = Vec::new();
        self.visit(&mut |formula| {
            if let FormulaKind::Constant(constant) = formula.kind() {
                stamps.extend(constant.stamp);
            }
        });
        stamps.sort_unstable();
        stamps.dedup();
        stamps
    }
}
