//! Modernity - longitudinal C# language-feature adoption analyzer.
//!
//! Modernity samples the commit history of C# repositories and counts, per
//! sampled commit, how often each versioned language feature (C# 7.1
//! through 12.0) appears in the checked-out sources. The output is one
//! catalog-shaped histogram per sampled commit, suitable for adoption
//! studies across time.
//!
//! # Architecture
//!
//! - `catalog`: version buckets and counters; seeds per-commit results
//! - `syntax`: owned syntax tree model the rules run against
//! - `semantic`: best-effort per-file symbol/type facts
//! - `detect`: ~75 version-tagged rules, the traversal walker included
//! - `aggregate`: per-commit aggregation across source files
//! - `sampler`: commit qualification and stride/recency sampling
//! - `vcs`: git collaborator (clone, log, checkout)
//! - `parser`: project discovery and tree-sitter C# lowering
//! - `repolist` / `report`: manifest input and timeline output
//! - `pipeline`: sequential per-repository orchestration

pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod detect;
pub mod parser;
pub mod pipeline;
pub mod repolist;
pub mod report;
pub mod sampler;
pub mod semantic;
pub mod syntax;
pub mod vcs;

pub use catalog::{CommitResult, CsVersion, VersionBucket};
pub use detect::walker::{walk, AnalyzeError};
pub use parser::{CSharpParser, SourceParser};
pub use sampler::{CommitInfo, CommitSampler, Disqualified, SamplerConfig};
pub use semantic::SemanticModel;
pub use syntax::{NodeId, NodeKind, SyntaxTree, TreeBuilder};
