//! The repository manifest: which repositories to analyze.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One repository to analyze, as listed in the manifest JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub clone_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub size: u64,
}

/// Load the manifest: a JSON array of repository entries.
pub fn load(path: &Path) -> anyhow::Result<Vec<RepoEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading repository manifest {}", path.display()))?;
    let entries: Vec<RepoEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing repository manifest {}", path.display()))?;
    Ok(entries)
}
