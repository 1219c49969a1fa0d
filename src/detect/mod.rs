//! The detector set: version-tagged classification rules over syntax nodes.
//!
//! Rules are grouped into one module per language-version family. Each rule
//! is a pure predicate-and-increment: evaluated at a single node, it bumps
//! exactly one catalog counter on match. Rules are independent - several
//! may match the same node and none suppresses another - and stateless
//! across calls.
//!
//! Dispatch is a closed match over [`NodeKind`] inside each family module,
//! so a node only ever reaches the rules that can apply to its shape.

mod v10;
mod v11;
mod v12;
mod v7;
mod v8;
mod v9;
pub mod walker;

use thiserror::Error;

use crate::catalog::{CommitResult, DriftError};
use crate::semantic::SemanticModel;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// A rule failure at one node.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A rule fed a counter the catalog does not declare. Registration
    /// defect; fatal to the file being analyzed.
    #[error(transparent)]
    Drift(#[from] DriftError),

    /// A node did not have the shape its grammar production guarantees
    /// (truncated or damaged tree). Local to the node; the walk continues.
    #[error("malformed {kind:?} node: {reason}")]
    Malformed { kind: NodeKind, reason: &'static str },
}

impl DetectError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectError::Drift(_))
    }
}

/// Outcome of running the full rule set at one node. Failure isolation is
/// part of the contract, so it is visible in the type rather than implied
/// by control flow.
#[derive(Debug)]
pub enum NodeOutcome {
    Clean,
    Faulted(DetectError),
}

/// Everything a rule may look at: the tree and the per-file semantics.
/// The accumulator travels separately as `&mut` so exactly one result is
/// alive per in-flight file analysis.
pub struct Ctx<'a> {
    pub tree: &'a SyntaxTree,
    pub model: &'a SemanticModel,
}

/// Run every applicable rule against one node. The first failing rule
/// short-circuits the remainder for this node; the walker decides whether
/// the failure is fatal to the file.
pub fn scan_node(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> NodeOutcome {
    let run = |out: &mut CommitResult| -> Result<(), DetectError> {
        v7::scan(ctx, node, out)?;
        v8::scan(ctx, node, out)?;
        v9::scan(ctx, node, out)?;
        v10::scan(ctx, node, out)?;
        v11::scan(ctx, node, out)?;
        v12::scan(ctx, node, out)?;
        Ok(())
    };
    match run(out) {
        Ok(()) => NodeOutcome::Clean,
        Err(e) => NodeOutcome::Faulted(e),
    }
}

/// Child expression nodes of `id`, in order.
fn expression_children(tree: &SyntaxTree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    tree.children(id)
        .iter()
        .copied()
        .filter(move |&c| tree.kind(c).is_expression())
}

/// The three operands of a conditional expression, or a malformed-node
/// error when the tree is truncated.
fn conditional_operands(
    tree: &SyntaxTree,
    id: NodeId,
) -> Result<(NodeId, NodeId, NodeId), DetectError> {
    let mut exprs = expression_children(tree, id);
    match (exprs.next(), exprs.next(), exprs.next()) {
        (Some(c), Some(t), Some(f)) => Ok((c, t, f)),
        _ => Err(DetectError::Malformed {
            kind: NodeKind::ConditionalExpression,
            reason: "expected condition and two branches",
        }),
    }
}

/// Left and right operands of a binary expression.
fn binary_operands(tree: &SyntaxTree, id: NodeId) -> Result<(NodeId, NodeId), DetectError> {
    let mut exprs = expression_children(tree, id);
    match (exprs.next(), exprs.next()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(DetectError::Malformed {
            kind: tree.kind(id),
            reason: "expected two operands",
        }),
    }
}

/// Attribute nodes attached to a declaration, with their names, flattened
/// across attribute lists.
fn attribute_names(tree: &SyntaxTree, declaration: NodeId) -> Vec<(NodeId, String)> {
    let mut names = Vec::new();
    for list in tree.children_of_kind(declaration, NodeKind::AttributeList) {
        for attr in tree.children_of_kind(list, NodeKind::Attribute) {
            let name = tree
                .first_type_child(attr)
                .map(|n| tree.text(n).to_string())
                .unwrap_or_else(|| tree.text(attr).to_string());
            names.push((attr, name));
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, counters, CsVersion};
    use crate::syntax::TreeBuilder;

    pub(crate) fn scan_tree(tree: &SyntaxTree) -> CommitResult {
        let model = SemanticModel::build(tree);
        let ctx = Ctx { tree, model: &model };
        let mut out = catalog::new_result("01-01-2024");
        let mut ids = vec![tree.root()];
        ids.extend(tree.descendants(tree.root()));
        for id in ids {
            match scan_node(&ctx, id, &mut out) {
                NodeOutcome::Clean => {}
                NodeOutcome::Faulted(e) => panic!("unexpected fault: {e}"),
            }
        }
        out
    }

    #[test]
    fn independent_rules_both_fire_on_one_node() {
        // An `in` parameter feeds both the "in parameters" counter and the
        // overlapping "in" counter.
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let pl = b.child(root, NodeKind::ParameterList, "(in int x)");
        let p = b.child(pl, NodeKind::Parameter, "in int x");
        b.child(p, NodeKind::Modifier, "in");
        b.child(p, NodeKind::PredefinedType, "int");
        b.child(p, NodeKind::IdentifierName, "x");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(out.count(CsVersion::V7_2, counters::IN_PARAMETERS), Some(1));
        assert_eq!(out.count(CsVersion::V7_2, counters::IN_MODIFIER), Some(1));
    }

    #[test]
    fn malformed_conditional_faults_without_counting() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        // A conditional with a single operand cannot be classified.
        let cond = b.child(root, NodeKind::ConditionalExpression, "x ?");
        b.child(cond, NodeKind::IdentifierName, "x");
        let tree = b.finish();

        let model = SemanticModel::build(&tree);
        let ctx = Ctx {
            tree: &tree,
            model: &model,
        };
        let mut out = catalog::new_result("01-01-2024");

        match scan_node(&ctx, cond, &mut out) {
            NodeOutcome::Faulted(e) => assert!(!e.is_fatal()),
            NodeOutcome::Clean => panic!("expected a malformed-node fault"),
        }
        assert_eq!(out.total(), 0);
    }
}
