//! `blogsync status`: what the last sync recorded.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use blogsync_core::Manifest;
use blogsync_sync::ManifestStore;

use super::ConfigArgs;

/// Arguments for `blogsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let store = ManifestStore::for_root(&self.config.root, &config);
        let manifest = store
            .load()
            .with_context(|| format!("failed to read manifest {}", store.path().display()))?;

        if self.json {
            print_json(&store, manifest.as_ref())?;
            return Ok(());
        }
        print_table(&store, manifest.as_ref());
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    manifest_path: String,
    synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sync_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sync_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<&'a Manifest>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "category")]
    category: String,
    #[tabled(rename = "posts")]
    posts: usize,
    #[tabled(rename = "last sync")]
    last_sync: String,
    #[tabled(rename = "synced at")]
    synced_at: String,
}

fn print_json(store: &ManifestStore, manifest: Option<&Manifest>) -> Result<()> {
    let payload = StatusJson {
        manifest_path: store.path().display().to_string(),
        synced: manifest.is_some(),
        last_sync_at: manifest.map(|m| m.timestamp.to_rfc3339()),
        last_sync_age: manifest.map(|m| format_datetime_age(m.timestamp)),
        manifest,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(store: &ManifestStore, manifest: Option<&Manifest>) {
    println!(
        "blogsync v{} | {}",
        env!("CARGO_PKG_VERSION"),
        store.path().display()
    );

    let Some(manifest) = manifest else {
        println!("{} No manifest yet. Run 'blogsync sync' to create one.", "■".bright_black().bold());
        return;
    };

    let table = Table::new([StatusTableRow {
        category: format!("{} (#{})", manifest.category_slug, manifest.category_id),
        posts: manifest.total_count,
        last_sync: format_datetime_age(manifest.timestamp),
        synced_at: manifest.timestamp.to_rfc3339(),
    }])
    .with(Style::rounded())
    .to_string();
    println!("{table}");

    if manifest.post_slugs.is_empty() {
        println!("No posts recorded.");
        return;
    }
    println!("{}", "POSTS".bold());
    for slug in &manifest.post_slugs {
        println!("  {} {slug}", "■".green());
    }
}

/// Compact age: `42s`, `5m`, `3h`, `2d`.
fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ages_are_compact() {
        let now = Utc::now();
        assert_eq!(format_datetime_age(now), "0s");
        assert_eq!(format_datetime_age(now - Duration::seconds(65)), "1m");
        assert_eq!(format_datetime_age(now - Duration::hours(3)), "3h");
        assert_eq!(format_datetime_age(now - Duration::days(2)), "2d");
        assert_eq!(format_datetime_age(now + Duration::hours(1)), "0s");
    }
}
