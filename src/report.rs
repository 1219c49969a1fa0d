//! The persistence collaborator: timeline serialization and the per-repo
//! console summary.
//!
//! One JSON file per repository, named after the repository and the day
//! the analysis ran. A result file that already exists marks the
//! repository as done; the pipeline skips it without cloning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::catalog::CommitResult;

/// Result file location for one repository analyzed on the given day.
pub fn result_path(results_dir: &Path, repo_name: &str, day: DateTime<Utc>) -> PathBuf {
    results_dir.join(format!("{repo_name}-{}.json", day.format("%m-%d-%Y")))
}

/// Whether a repository already has a result file for the day.
pub fn already_reported(path: &Path) -> bool {
    path.exists()
}

/// Serialize one repository's timeline as `{ "<name>": [commit, ...] }`.
pub fn write_timeline(
    path: &Path,
    repo_name: &str,
    timeline: &[CommitResult],
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating results directory {}", parent.display()))?;
        }
    }
    let document = BTreeMap::from([(repo_name, timeline)]);
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// One-line console summary per version bucket, totalled across the
/// repository's sampled commits.
pub fn print_summary(repo_name: &str, timeline: &[CommitResult]) {
    println!(
        "{} {} ({} sampled commits)",
        "done:".green().bold(),
        repo_name.bold(),
        timeline.len()
    );
    let Some(first) = timeline.first() else {
        return;
    };
    for bucket in &first.versions {
        let total: u64 = timeline
            .iter()
            .filter_map(|c| c.bucket(bucket.version))
            .map(|b| b.total())
            .sum();
        let line = format!("  C# {:<5} {:>8} hits", bucket.version.to_string(), total);
        if total == 0 {
            println!("{}", line.as_str().dimmed());
        } else {
            println!("{line}");
        }
    }
}
