//! Command-line interface.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::catalog;
use crate::pipeline::Pipeline;
use crate::repolist;
use crate::sampler::CommitSampler;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Longitudinal C# language-feature adoption analyzer.
///
/// Samples the commit history of each listed repository and counts, per
/// sampled commit, how often each versioned C# language feature appears in
/// the checked-out sources. One JSON timeline is written per repository.
#[derive(Parser)]
#[command(name = "modernity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone, sample and analyze every repository in the manifest
    Scan(ScanArgs),
    /// Print the feature catalog: buckets and counter names
    Catalog,
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Repository manifest (JSON array of {name, clone_url, ...})
    #[arg(long, default_value = "repos.json")]
    pub repos: PathBuf,

    /// Scratch directory for clones; emptied between repositories
    #[arg(long, default_value = "scratch")]
    pub workdir: PathBuf,

    /// Directory result files are written to
    #[arg(long, default_value = "results")]
    pub results: PathBuf,

    /// Pin the analysis instant (RFC 3339) for reproducible runs
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let repos = repolist::load(&args.repos)?;
    println!("{} repositories in manifest", repos.len());

    let now = args.now.unwrap_or_else(Utc::now);
    let sampler = CommitSampler::new(now);
    let pipeline = Pipeline::new(args.workdir.clone(), args.results.clone(), sampler);

    let written = pipeline.run(&repos)?;
    println!("{written} timelines written to {}", args.results.display());
    Ok(EXIT_SUCCESS)
}

/// Print the registered version buckets and their counters.
pub fn run_catalog() -> i32 {
    for &(version, names) in catalog::CATALOG {
        println!("C# {version} ({} counters)", names.len());
        for name in names {
            println!("  {name}");
        }
    }
    EXIT_SUCCESS
}
