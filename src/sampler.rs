//! Commit sampling policy.
//!
//! Given a repository's full commit list (oldest to newest), decide which
//! commits get analyzed: qualification gates on history volume and recent
//! activity, then a stride walk spaces samples across the list while a
//! recency window keeps ancient commits out.
//!
//! The stride/recency interaction is preserved exactly as published,
//! including its known degradation: a burst of very old commits followed by
//! a quiet tail can yield far fewer than the targeted sample count, or even
//! zero, despite the repository qualifying. Eligibility is evaluated per
//! commit during the walk and the drift guard resets the position counter
//! one past the stride.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use thiserror::Error;

/// A commit descriptor as handed over by the VCS collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Commit hash.
    pub id: String,
    /// Committer timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Sampling tunables. The defaults match the published measurement setup.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Repositories with fewer commits are skipped outright.
    pub min_commit_count: usize,
    /// Repositories whose newest commit is older than this are skipped.
    pub stale_cutoff: Months,
    /// Commits older than this are never sampled.
    pub recency_window: Months,
    /// Intended number of samples; the stride is derived from it.
    pub target_sample_count: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_commit_count: 300,
            stale_cutoff: Months::new(12),
            recency_window: Months::new(72),
            target_sample_count: 100,
        }
    }
}

/// Expected, non-error reasons a repository yields no timeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Disqualified {
    #[error("only {found} commits, need at least {required}")]
    TooFewCommits { found: usize, required: usize },

    #[error("newest commit ({newest}) predates the staleness cutoff ({cutoff})")]
    Stale {
        newest: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },

    #[error("sampling produced no analyzable commits")]
    NoSamples,
}

/// Decides which commits of one repository are analyzed.
#[derive(Debug, Clone)]
pub struct CommitSampler {
    config: SamplerConfig,
    now: DateTime<Utc>,
}

impl CommitSampler {
    /// Sampler anchored at the given analysis instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_config(now, SamplerConfig::default())
    }

    pub fn with_config(now: DateTime<Utc>, config: SamplerConfig) -> Self {
        Self { config, now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Repository-level gate, evaluated once before sampling. `commits`
    /// must be ordered oldest to newest.
    pub fn qualify(&self, commits: &[CommitInfo]) -> Result<(), Disqualified> {
        if commits.len() < self.config.min_commit_count {
            return Err(Disqualified::TooFewCommits {
                found: commits.len(),
                required: self.config.min_commit_count,
            });
        }
        let cutoff = self.now - self.config.stale_cutoff;
        let Some(newest) = commits.last() else {
            return Err(Disqualified::TooFewCommits {
                found: 0,
                required: self.config.min_commit_count.max(1),
            });
        };
        if newest.timestamp < cutoff {
            return Err(Disqualified::Stale {
                newest: newest.timestamp,
                cutoff,
            });
        }
        Ok(())
    }

    /// Spacing between samples, in commit-list positions.
    pub fn stride(&self, total: usize) -> usize {
        total / self.config.target_sample_count
    }

    /// Indices of the commits to sample, oldest to newest.
    ///
    /// A commit is taken when it falls inside the recency window and the
    /// position counter has reached the stride; the counter then restarts.
    /// If the counter overshoots to `stride + 1` without a sample (the
    /// commit at the stride position was too old), it resets unsampled.
    pub fn plan(&self, commits: &[CommitInfo]) -> Vec<usize> {
        let stride = self.stride(commits.len());
        let window_start = self.now - self.config.recency_window;

        let mut picks = Vec::new();
        let mut counter = 0usize;
        for (idx, commit) in commits.iter().enumerate() {
            if commit.timestamp > window_start && counter == stride {
                counter = 0;
                picks.push(idx);
            } else {
                counter += 1;
            }
            if counter == stride + 1 {
                counter = 0;
            }
        }
        picks
    }
}
