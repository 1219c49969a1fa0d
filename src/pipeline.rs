//! Per-repository orchestration: clone, qualify, sample, aggregate.
//!
//! Everything here is strictly sequential. A checkout rewrites the shared
//! working directory, so commit N+1 is never checked out before commit N's
//! files are fully analyzed.

use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::aggregate;
use crate::catalog::CommitResult;
use crate::parser::{self, CSharpParser};
use crate::repolist::RepoEntry;
use crate::report;
use crate::sampler::{CommitInfo, CommitSampler, Disqualified};
use crate::vcs;

/// Drives the full scan across a manifest of repositories.
pub struct Pipeline {
    workdir: PathBuf,
    results_dir: PathBuf,
    sampler: CommitSampler,
    parser: CSharpParser,
}

impl Pipeline {
    pub fn new(workdir: PathBuf, results_dir: PathBuf, sampler: CommitSampler) -> Self {
        Self {
            workdir,
            results_dir,
            sampler,
            parser: CSharpParser::new(),
        }
    }

    /// Analyze every repository in the manifest, one at a time. Already
    /// reported repositories are skipped; a failing repository never stops
    /// the run.
    pub fn run(&self, repos: &[RepoEntry]) -> anyhow::Result<usize> {
        let mut written = 0;
        for repo in repos {
            let out_path = report::result_path(&self.results_dir, &repo.name, self.sampler.now());
            if report::already_reported(&out_path) {
                info!(repo = %repo.name, path = %out_path.display(), "results exist, skipping");
                continue;
            }

            match self.run_repository(repo) {
                Ok(Some(timeline)) => {
                    report::write_timeline(&out_path, &repo.name, &timeline)?;
                    report::print_summary(&repo.name, &timeline);
                    written += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(repo = %repo.name, "repository failed: {e:#}");
                }
            }
        }
        Ok(written)
    }

    /// Analyze one repository. `Ok(None)` is the expected outcome for a
    /// disqualified repository (too little history, stale, or a sample
    /// plan that produced nothing).
    pub fn run_repository(&self, repo: &RepoEntry) -> anyhow::Result<Option<Vec<CommitResult>>> {
        clear_directory(&self.workdir)?;
        let checkout_dir = self.workdir.join(&repo.name);
        let repository = vcs::clone_repo(&repo.clone_url, &checkout_dir)
            .with_context(|| format!("cloning {}", repo.clone_url))?;

        let commits = vcs::commit_log(&repository).context("listing commits")?;
        info!(repo = %repo.name, commits = commits.len(), "commit history loaded");

        if let Err(reason) = self.sampler.qualify(&commits) {
            info!(repo = %repo.name, "disqualified: {reason}");
            return Ok(None);
        }

        let picks = self.sampler.plan(&commits);
        info!(
            repo = %repo.name,
            samples = picks.len(),
            stride = self.sampler.stride(commits.len()),
            "sampling plan ready"
        );

        let bar = ProgressBar::new(picks.len() as u64);
        let mut timeline = Vec::new();
        for idx in picks {
            let commit = &commits[idx];
            if let Err(e) = self.analyze_sample(&repository, &checkout_dir, commit, &mut timeline) {
                warn!(commit = %commit.id, "sample skipped: {e:#}");
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if timeline.is_empty() {
            info!(repo = %repo.name, "disqualified: {}", Disqualified::NoSamples);
            return Ok(None);
        }
        Ok(Some(timeline))
    }

    fn analyze_sample(
        &self,
        repository: &git2::Repository,
        checkout_dir: &Path,
        commit: &CommitInfo,
        timeline: &mut Vec<CommitResult>,
    ) -> anyhow::Result<()> {
        vcs::checkout(repository, commit).context("checkout")?;

        if parser::find_project_file(checkout_dir).is_none() {
            info!(commit = %commit.id, "no solution or project file, skipping sample");
            return Ok(());
        }
        let files = parser::source_files(checkout_dir);
        let label = commit.timestamp.format("%d-%m-%Y").to_string();

        if let Some(result) = aggregate::analyze_commit(&self.parser, &files, &label) {
            timeline.push(result);
        }
        Ok(())
    }
}

/// Empty the scratch directory between repositories. Clones accumulate
/// fast; the previous repository's checkout must never leak into the next.
pub fn clear_directory(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating scratch directory {}", path.display()))?;
        return Ok(());
    }
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let target = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&target)
                .with_context(|| format!("removing {}", target.display()))?;
        } else {
            std::fs::remove_file(&target)
                .with_context(|| format!("removing {}", target.display()))?;
        }
    }
    Ok(())
}
