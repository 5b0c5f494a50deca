//! `blogsync post <slug>`: single-post lookup.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use blogsync_core::{ContentEntity, ContentSource};
use blogsync_fetch::{FallbackDataset, Fetcher, SlugLookup};

use super::ConfigArgs;

/// Arguments for `blogsync post`.
#[derive(Args, Debug)]
pub struct PostArgs {
    /// Slug of the post to look up.
    pub slug: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PostJson<'a> {
    source: ContentSource,
    post: &'a ContentEntity,
}

impl PostArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let fetcher = Fetcher::with_ureq(config, FallbackDataset::builtin());

        let (entity, source) = match fetcher.lookup_by_slug(&self.slug) {
            SlugLookup::Found { entity, source } => (entity, source),
            SlugLookup::NotFound => {
                println!("{} no post with slug '{}'", "✗".red(), self.slug);
                bail!("post '{}' not found", self.slug);
            }
        };

        if self.json {
            let payload = PostJson {
                source,
                post: &entity,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize post JSON")?
            );
            return Ok(());
        }

        println!("{}", entity.title.bold());
        println!(
            "  slug: {}  id: {}  source: {source}",
            entity.slug, entity.id
        );
        println!(
            "  published: {}  modified: {}",
            entity.date.format("%Y-%m-%d"),
            entity.modified.format("%Y-%m-%d")
        );
        if let Some(author) = &entity.author {
            println!("  author: {}", author.name);
        }
        if !entity.categories.is_empty() {
            let names: Vec<&str> = entity.categories.iter().map(|c| c.name.as_str()).collect();
            println!("  categories: {}", names.join(", "));
        }
        if !entity.tags.is_empty() {
            let names: Vec<&str> = entity.tags.iter().map(|t| t.name.as_str()).collect();
            println!("  tags: {}", names.join(", "));
        }
        if !entity.excerpt.is_empty() {
            println!();
            println!("{}", entity.excerpt);
        }
        Ok(())
    }
}
