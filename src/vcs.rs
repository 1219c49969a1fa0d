//! The version-control collaborator: clone, commit enumeration, checkout.
//!
//! Checkout mutates the shared working directory the parsing collaborator
//! reads, so callers must finish analyzing one commit before checking out
//! the next.

use std::path::Path;

use chrono::{TimeZone, Utc};
use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, Sort};
use tracing::info;

use crate::sampler::CommitInfo;

/// Clone a repository into `dest`.
pub fn clone_repo(url: &str, dest: &Path) -> Result<Repository, git2::Error> {
    info!(url, dest = %dest.display(), "cloning repository");
    Repository::clone(url, dest)
}

/// Open an existing working copy.
pub fn open_repo(path: &Path) -> Result<Repository, git2::Error> {
    Repository::open(path)
}

/// All commits reachable from HEAD as descriptors, ordered oldest to
/// newest by committer time.
pub fn commit_log(repo: &Repository) -> Result<Vec<CommitInfo>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        let seconds = commit.time().seconds();
        let timestamp = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);
        commits.push(CommitInfo {
            id: oid.to_string(),
            timestamp,
        });
    }
    // Revwalk yields newest first; the sampler wants oldest first.
    commits.reverse();
    Ok(commits)
}

/// Force-checkout the given commit, leaving HEAD detached on it.
pub fn checkout(repo: &Repository, commit: &CommitInfo) -> Result<(), git2::Error> {
    let oid = Oid::from_str(&commit.id)?;
    let object = repo.find_object(oid, None)?;
    let mut opts = CheckoutBuilder::new();
    opts.force();
    repo.checkout_tree(&object, Some(&mut opts))?;
    repo.set_head_detached(oid)
}
