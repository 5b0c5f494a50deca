//! Build-time configuration.
//!
//! # Resolution order
//!
//! 1. [`SyncConfig::default`]
//! 2. YAML file: explicit `--config` path, else `<root>/blogsync.yaml` if present
//! 3. Environment: `WORDPRESS_API_URL`, `WORDPRESS_CATEGORY_SLUG`, `CI`,
//!    `GITHUB_ACTIONS`
//!
//! CLI flags are applied on top by the caller.
//!
//! # API pattern
//!
//! - `resolve_at(root, file, lookup)`: explicit environment lookup, used in tests
//! - `resolve(root, file)`: reads the process environment and delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name probed in the build root when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "blogsync.yaml";

/// Manifest file name written by earlier site builds.
pub const DEFAULT_MANIFEST_FILE: &str = ".wordpress-posts-manifest.json";

/// Everything the fetcher and orchestrator need, resolved once per build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// WordPress REST base, e.g. `https://example.com/wp-json/wp/v2`.
    pub api_base_url: String,
    /// Slug of the category posts are filtered by.
    pub category_slug: String,
    /// Alternative slugs accepted when the exact slug is not found.
    pub category_aliases: Vec<String>,
    /// Case-insensitive substring matched against category names last.
    pub category_name_hint: String,
    /// Category id used when the category lookup fails.
    pub fallback_category_id: u64,
    pub timeout_secs: u64,
    pub ci_timeout_secs: u64,
    /// Running under CI: longer timeouts and a distinct user agent.
    pub ci: bool,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    /// Append a `_=<unix millis>` query parameter to defeat HTTP caches.
    pub cache_bust: bool,
    pub page_size: u32,
    pub max_pages: u32,
    /// Manifest location, relative to the build root.
    pub manifest_file: PathBuf,
    /// Generated site directory, relative to the build root.
    pub output_root: PathBuf,
    /// Directory under `output_root` holding one directory per post.
    pub blog_dir: PathBuf,
    /// Cleanup is skipped when the post count drops by more than this.
    pub drop_threshold_percent: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://blog.nxtmt.ventures/wp-json/wp/v2".to_string(),
            category_slug: "astrobot-design".to_string(),
            category_aliases: vec!["astrobotdesign".to_string()],
            category_name_hint: "astrobot".to_string(),
            fallback_category_id: 1,
            timeout_secs: 10,
            ci_timeout_secs: 15,
            ci: false,
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
            cache_bust: true,
            page_size: 100,
            max_pages: 50,
            manifest_file: PathBuf::from(DEFAULT_MANIFEST_FILE),
            output_root: PathBuf::from("dist"),
            blog_dir: PathBuf::from("blog"),
            drop_threshold_percent: 50.0,
        }
    }
}

impl SyncConfig {
    /// Resolve configuration for a build rooted at `root`, reading environment
    /// variables through `lookup`.
    pub fn resolve_at<F>(
        root: &Path,
        config_file: Option<&Path>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_file {
            Some(path) => Self::load_file(&root.join(path))?,
            None => {
                let probe = root.join(DEFAULT_CONFIG_FILE);
                if probe.exists() {
                    Self::load_file(&probe)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// `resolve_at` convenience wrapper over the process environment.
    pub fn resolve(root: &Path, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_at(root, config_file, |key| std::env::var(key).ok())
    }

    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("WORDPRESS_API_URL") {
            self.api_base_url = url;
        }
        if let Some(slug) = non_empty("WORDPRESS_CATEGORY_SLUG") {
            self.category_slug = slug;
        }
        if non_empty("CI").is_some_and(|v| is_truthy(&v))
            || non_empty("GITHUB_ACTIONS").is_some_and(|v| is_truthy(&v))
        {
            self.ci = true;
        }
    }

    /// Reject values no build could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.category_slug.trim().is_empty() {
            return Err(ConfigError::Invalid("category_slug must not be empty".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.drop_threshold_percent) {
            return Err(ConfigError::Invalid(format!(
                "drop_threshold_percent must be within 0..=100, got {}",
                self.drop_threshold_percent
            )));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "backoff_multiplier must be at least 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Per-request timeout for the current environment.
    pub fn timeout(&self) -> Duration {
        if self.ci {
            Duration::from_secs(self.ci_timeout_secs)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// User agent for the current environment.
    pub fn user_agent(&self) -> String {
        let env = if self.ci { "ci" } else { "local" };
        format!("blogsync/{} ({env})", env!("CARGO_PKG_VERSION"))
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Absolute manifest path for a build rooted at `root`.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest_file)
    }

    /// Directory holding one sub-directory per generated post.
    pub fn posts_root(&self, root: &Path) -> PathBuf {
        root.join(&self.output_root).join(&self.blog_dir)
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
