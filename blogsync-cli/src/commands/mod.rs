pub mod fetch;
pub mod post;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use blogsync_core::SyncConfig;

/// Build root and config overrides shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Build root holding the manifest and the output tree.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// YAML config file, relative to the root (default: `blogsync.yaml` if present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WordPress REST base URL (overrides config and `WORDPRESS_API_URL`).
    #[arg(long)]
    pub api_url: Option<String>,

    /// Category slug to filter by (overrides config and `WORDPRESS_CATEGORY_SLUG`).
    #[arg(long)]
    pub category_slug: Option<String>,
}

impl ConfigArgs {
    /// Defaults, then config file, then environment, then these flags.
    pub fn resolve(&self) -> Result<SyncConfig> {
        let mut config = SyncConfig::resolve(&self.root, self.config.as_deref())
            .with_context(|| format!("failed to load configuration under {}", self.root.display()))?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(slug) = &self.category_slug {
            config.category_slug = slug.clone();
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
