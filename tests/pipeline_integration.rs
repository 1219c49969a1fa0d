//! End-to-end pipeline test over a synthetic git repository.
//!
//! Builds a local repository with backdated commits, points the pipeline at
//! it through the regular clone path, and checks the resulting timeline.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use git2::{Repository, Signature, Time};
use tempfile::TempDir;

use modernity::catalog::{self, counters, CsVersion};
use modernity::pipeline::Pipeline;
use modernity::repolist::RepoEntry;
use modernity::sampler::CommitSampler;

const SOURCE: &str = r#"using System;

record Ping(int Sequence);

class Archive
{
    private protected int mask = 0x_FF;

    static void Main(string[] args)
    {
        Console.WriteLine(args.Length);
    }
}
"#;

/// Build a repository whose `count` commits are spaced one hour apart,
/// ending shortly before now. Every commit carries a solution file and one
/// C# source.
fn seed_repository(dir: &Path, count: usize) -> Repository {
    let repo = Repository::init(dir).unwrap();
    fs::write(dir.join("App.sln"), "Microsoft Visual Studio Solution File\n").unwrap();

    let start = Utc::now() - Duration::hours(count as i64 + 1);
    for i in 0..count {
        fs::write(
            dir.join("Program.cs"),
            format!("{SOURCE}\n// revision {i}\n"),
        )
        .unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(&PathBuf::from("App.sln")).unwrap();
        index.add_path(&PathBuf::from("Program.cs")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let when = start + Duration::hours(i as i64);
        let sig = Signature::new(
            "tester",
            "tester@example.com",
            &Time::new(when.timestamp(), 0),
        )
        .unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| vec![repo.find_commit(oid).unwrap()])
            .unwrap_or_default();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            &format!("revision {i}"),
            &tree,
            &parent_refs,
        )
        .unwrap();
    }
    repo
}

fn entry_for(dir: &Path, name: &str) -> RepoEntry {
    RepoEntry {
        name: name.to_string(),
        clone_url: dir.to_str().unwrap().to_string(),
        html_url: String::new(),
        stargazers_count: 0,
        size: 0,
    }
}

#[test]
fn samples_and_analyzes_a_qualifying_repository() {
    let origin = TempDir::new().unwrap();
    seed_repository(origin.path(), 320);

    let scratch = TempDir::new().unwrap();
    let results = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        scratch.path().to_path_buf(),
        results.path().to_path_buf(),
        CommitSampler::new(Utc::now()),
    );

    let timeline = pipeline
        .run_repository(&entry_for(origin.path(), "synthetic"))
        .unwrap()
        .expect("repository qualifies and has recent commits");

    // 320 commits, stride 3: one sample every 4 positions starting at
    // index 3.
    assert_eq!(timeline.len(), 80);

    for result in &timeline {
        assert_eq!(result.versions.len(), catalog::CATALOG.len());
        assert_eq!(result.count(CsVersion::V9_0, counters::RECORDS), Some(1));
        assert_eq!(
            result.count(CsVersion::V7_2, counters::PRIVATE_PROTECTED),
            Some(1)
        );
        assert_eq!(
            result.count(CsVersion::V7_2, counters::DIGIT_SEPARATORS),
            Some(1)
        );
    }

    // Timeline is oldest to newest by the commit date label's origin, and
    // labels are present on every result.
    assert!(timeline.iter().all(|r| !r.date.is_empty()));
}

#[test]
fn short_history_yields_no_timeline() {
    let origin = TempDir::new().unwrap();
    seed_repository(origin.path(), 120);

    let scratch = TempDir::new().unwrap();
    let results = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        scratch.path().to_path_buf(),
        results.path().to_path_buf(),
        CommitSampler::new(Utc::now()),
    );

    let outcome = pipeline
        .run_repository(&entry_for(origin.path(), "short"))
        .unwrap();
    assert!(outcome.is_none());
}

#[test]
fn full_run_writes_one_result_file_and_skips_reruns() {
    let origin = TempDir::new().unwrap();
    seed_repository(origin.path(), 320);

    let scratch = TempDir::new().unwrap();
    let results = TempDir::new().unwrap();
    let now = Utc::now();
    let repos = vec![entry_for(origin.path(), "synthetic")];

    let pipeline = Pipeline::new(
        scratch.path().to_path_buf(),
        results.path().to_path_buf(),
        CommitSampler::new(now),
    );
    let written = pipeline.run(&repos).unwrap();
    assert_eq!(written, 1);

    let files: Vec<_> = fs::read_dir(results.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);
    let raw = fs::read_to_string(files[0].path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["synthetic"].as_array().unwrap().len(), 80);

    // A second run sees the result file and skips the repository.
    let pipeline = Pipeline::new(
        scratch.path().to_path_buf(),
        results.path().to_path_buf(),
        CommitSampler::new(now),
    );
    let written = pipeline.run(&repos).unwrap();
    assert_eq!(written, 0);
}
