//! The parsing collaborator: project discovery and C# source parsing.
//!
//! This module provides:
//! - `SourceParser` trait: the seam the aggregator consumes trees through
//! - `CSharpParser`: tree-sitter backed implementation
//! - Discovery of build-project files and `.cs` sources in a checkout

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::syntax::SyntaxTree;

pub mod lower;

/// Produces a lowered syntax tree for one source file.
///
/// The aggregator only ever talks to this trait, so tests can feed it
/// hand-assembled trees.
pub trait SourceParser {
    fn parse_file(&self, path: &Path) -> anyhow::Result<SyntaxTree>;
}

/// Tree-sitter backed C# parser.
#[derive(Debug, Default)]
pub struct CSharpParser;

impl CSharpParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for CSharpParser {
    fn parse_file(&self, path: &Path) -> anyhow::Result<SyntaxTree> {
        let source = std::fs::read_to_string(path)?;
        lower::parse_source(&source)
    }
}

/// Directories never descended into: VCS metadata and build output.
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "packages", "node_modules"];

/// Find a solution or project file anywhere under `root`. A checkout
/// without one has no build graph to resolve and is skipped.
pub fn find_project_file(root: &Path) -> Option<PathBuf> {
    walk(root)
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            matches!(
                e.path().extension().and_then(|x| x.to_str()),
                Some("sln") | Some("csproj")
            )
        })
        .map(|e| e.into_path())
}

/// All C# source files under `root`, in directory order.
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    walk(root)
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("cs"))
        .map(|e| e.into_path())
        .collect()
}

fn walk(root: &Path) -> impl Iterator<Item = walkdir::Result<walkdir::DirEntry>> {
    WalkDir::new(root).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        if e.file_type().is_dir() && name.starts_with('.') {
            return false;
        }
        if e.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()) {
            return false;
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovery_skips_vcs_and_build_output() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(temp.path().join("bin")).unwrap();
        fs::write(temp.path().join("App.sln"), "").unwrap();
        fs::write(temp.path().join("src/Program.cs"), "class P { }").unwrap();
        fs::write(temp.path().join(".git/junk.cs"), "not source").unwrap();
        fs::write(temp.path().join("bin/Gen.cs"), "generated").unwrap();

        let files = source_files(temp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/Program.cs"));
        assert!(find_project_file(temp.path()).is_some());
    }

    #[test]
    fn checkout_without_project_file_is_detected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("loose.cs"), "class P { }").unwrap();

        assert!(find_project_file(temp.path()).is_none());
    }
}
