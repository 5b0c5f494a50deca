//! `blogsync sync`: fetch every post, reconcile, clean up, write the manifest.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use blogsync_core::{CategoryFilter, ContentSource, Slug};
use blogsync_fetch::{FallbackDataset, Fetcher};
use blogsync_sync::{CleanupStatus, SyncOrchestrator, SyncOutcome, SyncRequest};

use super::ConfigArgs;

/// Arguments for `blogsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Generated site directory, relative to the root.
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Posts requested per page (WordPress caps this at 100).
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Report what would be deleted without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config = self.config.resolve()?;
        if let Some(output_root) = self.output_root {
            config.output_root = output_root;
        }
        if let Some(per_page) = self.per_page {
            config.page_size = per_page;
        }
        config.validate().context("invalid configuration")?;
        let root = self.config.root;

        let orchestrator = SyncOrchestrator::from_config(&root, &config).dry_run(self.dry_run);
        let page_size = config.page_size;
        let fetcher = Fetcher::with_ureq(config, FallbackDataset::builtin());
        let fetched = fetcher.fetch_all(page_size);

        let source = fetched.source;
        let using_fallback = fetched.using_fallback();
        let category = fetched.category.clone();
        let outcome = orchestrator.sync(SyncRequest {
            entities: fetched.entities,
            category_id: category.id,
            category_slug: category.slug.clone(),
            using_fallback,
            previous_entity_count: None,
        });
        info!(
            success = outcome.success,
            dry_run = outcome.dry_run,
            using_fallback,
            new = outcome.comparison.new_slugs.len(),
            orphaned = outcome.comparison.orphaned_slugs.len(),
            deleted = outcome.deleted_count,
            "sync finished"
        );

        let manifest_path = orchestrator.store().path().to_path_buf();
        if self.json {
            print_json(&outcome, source, &category, &manifest_path)?;
        } else {
            print_summary(&outcome, source, &category, &manifest_path);
        }

        if !outcome.success {
            bail!("failed to write manifest {}", manifest_path.display());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SyncReportJson<'a> {
    success: bool,
    dry_run: bool,
    source: ContentSource,
    category: &'a CategoryFilter,
    summary: &'a str,
    new: &'a [Slug],
    unchanged: &'a [Slug],
    orphaned: &'a [Slug],
    cleanup: CleanupJson,
    manifest: ManifestJson,
}

#[derive(Serialize)]
struct CleanupJson {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    deleted: usize,
    would_delete: Vec<String>,
    errors: Vec<CleanupErrorJson>,
}

#[derive(Serialize)]
struct CleanupErrorJson {
    slug: String,
    error: String,
}

#[derive(Serialize)]
struct ManifestJson {
    path: String,
    total_count: usize,
}

fn print_json(
    outcome: &SyncOutcome,
    source: ContentSource,
    category: &CategoryFilter,
    manifest_path: &std::path::Path,
) -> Result<()> {
    let cleanup = match &outcome.cleanup {
        CleanupStatus::NothingToDo => CleanupJson {
            status: "nothing_to_do",
            reason: None,
            deleted: 0,
            would_delete: Vec::new(),
            errors: Vec::new(),
        },
        CleanupStatus::Skipped(reason) => CleanupJson {
            status: "skipped",
            reason: Some(reason.to_string()),
            deleted: 0,
            would_delete: Vec::new(),
            errors: Vec::new(),
        },
        CleanupStatus::Ran(report) => CleanupJson {
            status: "ran",
            reason: None,
            deleted: report.deleted_count,
            would_delete: report
                .would_delete
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            errors: report
                .errors
                .iter()
                .map(|(slug, err)| CleanupErrorJson {
                    slug: slug.to_string(),
                    error: err.to_string(),
                })
                .collect(),
        },
    };

    let payload = SyncReportJson {
        success: outcome.success,
        dry_run: outcome.dry_run,
        source,
        category,
        summary: &outcome.comparison.summary,
        new: &outcome.comparison.new_slugs,
        unchanged: &outcome.comparison.unchanged_slugs,
        orphaned: &outcome.comparison.orphaned_slugs,
        cleanup,
        manifest: ManifestJson {
            path: manifest_path.display().to_string(),
            total_count: outcome.manifest.total_count,
        },
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sync JSON")?
    );
    Ok(())
}

fn print_summary(
    outcome: &SyncOutcome,
    source: ContentSource,
    category: &CategoryFilter,
    manifest_path: &std::path::Path,
) {
    let prefix = if outcome.dry_run { "[dry-run] " } else { "" };
    let mark = if outcome.success { "✓".green() } else { "✗".red() };
    println!("{prefix}{mark} {}", outcome.comparison.summary);

    let source_label = match source {
        ContentSource::Remote => source.to_string().green(),
        ContentSource::Fallback(_) => source.to_string().yellow(),
    };
    println!(
        "  source:   {source_label}  category: {} (#{}, {})",
        category.slug, category.id, category.resolution
    );

    for slug in &outcome.comparison.new_slugs {
        println!("  +  {slug}");
    }
    for slug in &outcome.comparison.orphaned_slugs {
        println!("  -  {slug}");
    }

    match &outcome.cleanup {
        CleanupStatus::NothingToDo => println!("  cleanup:  nothing to remove"),
        CleanupStatus::Skipped(reason) => {
            println!("  cleanup:  {} ({reason})", "skipped".yellow())
        }
        CleanupStatus::Ran(report) if outcome.dry_run => {
            println!("  cleanup:  would delete {} director(ies)", report.would_delete.len());
            for path in &report.would_delete {
                println!("  ~  {}", path.display());
            }
        }
        CleanupStatus::Ran(report) => {
            println!("  cleanup:  deleted {}", report.deleted_count);
            for (slug, err) in &report.errors {
                println!("  {}  {slug}: {err}", "!".red());
            }
        }
    }

    let verb = match (outcome.dry_run, outcome.success) {
        (true, _) => "would write",
        (false, true) => "written",
        (false, false) => "NOT written",
    };
    println!(
        "  manifest: {verb} {} ({} posts)",
        manifest_path.display(),
        outcome.manifest.total_count
    );
}
