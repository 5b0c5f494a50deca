//! blogsync: build-time WordPress post sync.
//!
//! # Usage
//!
//! ```text
//! blogsync sync [--root DIR] [--config FILE] [--dry-run] [--json]
//! blogsync status [--root DIR] [--json]
//! blogsync fetch [--page N] [--per-page N] [--category-id ID] [--json]
//! blogsync post <slug> [--json]
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` filter);
//! stdout carries only command output.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{fetch::FetchArgs, post::PostArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "blogsync",
    version,
    about = "Sync WordPress posts into a static site build",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch all posts, reconcile with the last build, clean up removed posts.
    Sync(SyncArgs),

    /// Show the manifest recorded by the last sync.
    Status(StatusArgs),

    /// Fetch and list one page of posts.
    Fetch(FetchArgs),

    /// Look up a single post by slug.
    Post(PostArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Fetch(args) => args.run(),
        Commands::Post(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
