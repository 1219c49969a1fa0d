//! Per-commit aggregation: one result record fed by every source file of a
//! sampled commit.

use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::catalog::{self, CommitResult};
use crate::detect::walker;
use crate::parser::SourceParser;
use crate::semantic::SemanticModel;

/// Analyze one sampled commit: walk every discovered source file against a
/// single catalog-shaped accumulator.
///
/// Returns `None` when the discovered set is empty - "nothing to analyze"
/// is deliberately distinct from "measured, found nothing" (an all-zero
/// result). Files that fail to read or parse are skipped with a warning;
/// the commit still yields a result. A file is processed exactly once;
/// feeding the same path twice double-counts by contract.
pub fn analyze_commit(
    parser: &dyn SourceParser,
    files: &[PathBuf],
    date: &str,
) -> Option<CommitResult> {
    if files.is_empty() {
        debug!("no source files discovered, skipping commit");
        return None;
    }

    let mut result = catalog::new_result(date);
    for path in files {
        let tree = match parser.parse_file(path) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(file = %path.display(), "skipping unparsable file: {e}");
                continue;
            }
        };
        let model = SemanticModel::build(&tree);
        if let Err(e) = walker::walk(&tree, &model, &mut result) {
            // Catalog drift: this file's analysis is aborted, the commit
            // itself survives on the remaining files.
            error!(file = %path.display(), "file analysis aborted: {e}");
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    use crate::catalog::{counters, CsVersion};
    use crate::syntax::{NodeKind, SyntaxTree, TreeBuilder};

    /// Parser stub serving pre-built trees, standing in for the tree-sitter
    /// implementation behind the same seam.
    struct FixedTrees(HashMap<PathBuf, SyntaxTree>);

    impl SourceParser for FixedTrees {
        fn parse_file(&self, path: &Path) -> anyhow::Result<SyntaxTree> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
        }
    }

    fn tree_with_one_record() -> SyntaxTree {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let r = b.child(root, NodeKind::RecordDeclaration, "record Hit();");
        b.child(r, NodeKind::IdentifierName, "Hit");
        b.finish()
    }

    #[test]
    fn empty_file_set_yields_no_result() {
        let parser = FixedTrees(HashMap::new());
        assert!(analyze_commit(&parser, &[], "01-01-2024").is_none());
    }

    #[test]
    fn unreadable_files_are_skipped_not_fatal() {
        let mut trees = HashMap::new();
        trees.insert(PathBuf::from("a.cs"), tree_with_one_record());
        let parser = FixedTrees(trees);

        let files = vec![PathBuf::from("missing.cs"), PathBuf::from("a.cs")];
        let result = analyze_commit(&parser, &files, "01-01-2024").unwrap();

        assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(1));
    }

    #[test]
    fn result_keeps_catalog_shape_even_when_every_file_fails() {
        let parser = FixedTrees(HashMap::new());
        let files = vec![PathBuf::from("gone.cs")];
        let result = analyze_commit(&parser, &files, "02-02-2024").unwrap();

        assert_eq!(result.total(), 0);
        assert_eq!(result.versions.len(), catalog::CATALOG.len());
        assert_eq!(result.date, "02-02-2024");
    }

    #[test]
    fn same_file_twice_double_counts() {
        let mut trees = HashMap::new();
        trees.insert(PathBuf::from("a.cs"), tree_with_one_record());
        let parser = FixedTrees(trees);

        let files = vec![PathBuf::from("a.cs"), PathBuf::from("a.cs")];
        let result = analyze_commit(&parser, &files, "01-01-2024").unwrap();

        assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(2));
    }
}
