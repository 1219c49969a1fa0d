//! Modernity CLI entry point.

use clap::Parser;
use modernity::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Scan(args) => match cli::run_scan(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e:#}");
                EXIT_ERROR
            }
        },
        Commands::Catalog => cli::run_catalog(),
    };

    std::process::exit(exit_code);
}
