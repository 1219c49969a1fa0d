//! Pre-order traversal driving the detector set over one file's tree.

use thiserror::Error;
use tracing::warn;

use crate::catalog::{CommitResult, DriftError};
use crate::semantic::SemanticModel;
use crate::syntax::SyntaxTree;

use super::{scan_node, Ctx, DetectError, NodeOutcome};

/// Analysis of one file could not be completed.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("catalog drift: {0}")]
    Drift(#[from] DriftError),
}

/// Depth-first, pre-order walk applying the full detector set at every
/// node before descending into its children.
///
/// Failure isolation: a non-fatal fault at a node skips that node's
/// remaining rules but never its children or siblings. Catalog drift
/// aborts the file, since the accumulated counts can no longer be trusted
/// against the catalog shape.
pub fn walk(
    tree: &SyntaxTree,
    model: &SemanticModel,
    out: &mut CommitResult,
) -> Result<(), AnalyzeError> {
    if tree.is_empty() {
        return Ok(());
    }
    let ctx = Ctx { tree, model };
    let mut stack = vec![tree.root()];

    while let Some(node) = stack.pop() {
        match scan_node(&ctx, node, out) {
            NodeOutcome::Clean => {}
            NodeOutcome::Faulted(DetectError::Drift(e)) => return Err(e.into()),
            NodeOutcome::Faulted(e) => {
                warn!(
                    kind = ?tree.kind(node),
                    line = tree.line(node),
                    "detector fault, continuing into children: {e}"
                );
            }
        }
        // Children pushed in reverse so the leftmost is visited next.
        for &child in tree.children(node).iter().rev() {
            stack.push(child);
        }
    }
    Ok(())
}
