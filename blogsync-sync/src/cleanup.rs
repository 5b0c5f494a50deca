//! Cleanup executor: remove generated output for posts that no longer exist.
//!
//! The output directory for slug `s` is `<posts_root>/<s>`. Each slug is
//! handled independently; one failure never stops the rest.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use blogsync_core::Slug;

use crate::error::{io_err, SyncError};

/// Why one slug could not be cleaned up.
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// Empty, multi-component, `.`/`..` or absolute slug.
    #[error("refusing to delete unsafe slug {slug:?}")]
    UnsafeSlug { slug: String },

    /// Target exists but is a file or symlink.
    #[error("refusing to delete {path}: not a directory")]
    NotADirectory { path: PathBuf },

    #[error(transparent)]
    Io(#[from] SyncError),
}

/// Result of one cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub deleted_count: usize,
    /// Directories that would have been removed (dry run only).
    pub would_delete: Vec<PathBuf>,
    pub errors: Vec<(Slug, CleanupError)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Remove `<posts_root>/<slug>` for each slug. Missing directories are
/// skipped silently.
pub fn delete_orphans(slugs: &[Slug], posts_root: &Path) -> CleanupReport {
    run(slugs, posts_root, false)
}

/// Report which directories [`delete_orphans`] would remove, touching nothing.
pub fn plan_orphans(slugs: &[Slug], posts_root: &Path) -> CleanupReport {
    run(slugs, posts_root, true)
}

fn run(slugs: &[Slug], posts_root: &Path, dry_run: bool) -> CleanupReport {
    let mut report = CleanupReport::default();
    for slug in slugs {
        match remove_one(slug, posts_root, dry_run) {
            Ok(Some(path)) if dry_run => {
                info!(slug = %slug, path = %path.display(), "[dry-run] would delete post output");
                report.would_delete.push(path);
            }
            Ok(Some(path)) => {
                info!(slug = %slug, path = %path.display(), "deleted orphaned post output");
                report.deleted_count += 1;
            }
            Ok(None) => debug!(slug = %slug, "no output directory; nothing to delete"),
            Err(err) => {
                warn!(slug = %slug, error = %err, "cleanup failed for post");
                report.errors.push((slug.clone(), err));
            }
        }
    }
    report
}

/// `Ok(Some(path))` when the directory existed (and was removed unless
/// `dry_run`), `Ok(None)` when there was nothing to remove.
fn remove_one(slug: &Slug, posts_root: &Path, dry_run: bool) -> Result<Option<PathBuf>, CleanupError> {
    let path = output_dir(slug, posts_root)?;

    let meta = match std::fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(&path, err).into()),
    };
    if !meta.is_dir() {
        return Err(CleanupError::NotADirectory { path });
    }
    if !dry_run {
        std::fs::remove_dir_all(&path).map_err(|e| io_err(&path, e))?;
    }
    Ok(Some(path))
}

fn output_dir(slug: &Slug, posts_root: &Path) -> Result<PathBuf, CleanupError> {
    let unsafe_slug = || CleanupError::UnsafeSlug {
        slug: slug.to_string(),
    };
    let raw = slug.as_str();
    if raw.is_empty() || raw.contains(['/', '\\']) {
        return Err(unsafe_slug());
    }
    let mut components = Path::new(raw).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(posts_root.join(raw)),
        _ => Err(unsafe_slug()),
    }
}
