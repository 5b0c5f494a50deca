//! Sync orchestrator: one build-time pass over fetched posts.
//!
//! ## Sequence
//!
//! 1. Read the previous manifest (absent or unreadable → first build).
//! 2. Reconcile previous slugs against the current posts.
//! 3. Safety gate: skip cleanup on fallback data or a sharp count drop.
//! 4. Delete orphaned output directories (unless skipped or dry run).
//! 5. Build a manifest from the current posts.
//! 6. Write it atomically (skipped in dry run).
//!
//! Only step 6 decides `success`. Every other failure is logged and reported.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use blogsync_core::{ContentEntity, Manifest, Slug, SyncConfig};

use crate::cleanup::{self, CleanupReport};
use crate::manifest_store::ManifestStore;
use crate::reconcile::{self, ManifestComparison};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// Input to one sync pass.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub entities: Vec<ContentEntity>,
    pub category_id: u64,
    pub category_slug: String,
    pub using_fallback: bool,
    /// Count to measure the drop against. `None` uses the previous
    /// manifest's `total_count`.
    pub previous_entity_count: Option<usize>,
}

/// Why cleanup did not run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// Current posts came from the fallback dataset.
    FallbackData,
    /// Post count fell by more than the threshold.
    CountDrop { percent: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FallbackData => f.write_str("using fallback data"),
            SkipReason::CountDrop { percent } => write!(f, "post count dropped {percent:.1}%"),
        }
    }
}

/// What happened to orphaned output this pass.
#[derive(Debug)]
pub enum CleanupStatus {
    /// No orphans to remove.
    NothingToDo,
    Skipped(SkipReason),
    Ran(CleanupReport),
}

impl CleanupStatus {
    pub fn report(&self) -> Option<&CleanupReport> {
        match self {
            CleanupStatus::Ran(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of [`SyncOrchestrator::sync`].
#[derive(Debug)]
pub struct SyncOutcome {
    /// Exactly whether the manifest was persisted (always `true` in dry run).
    pub success: bool,
    pub comparison: ManifestComparison,
    pub deleted_count: usize,
    pub cleanup: CleanupStatus,
    /// The manifest written (or that would have been, in dry run).
    pub manifest: Manifest,
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Safety gate
// ---------------------------------------------------------------------------

/// Percentage fall from `previous` to `current`; 0 when `previous` is 0 or
/// the count grew.
pub fn drop_percent(previous: usize, current: usize) -> f64 {
    if previous == 0 || current >= previous {
        return 0.0;
    }
    (previous - current) as f64 / previous as f64 * 100.0
}

/// True when cleanup must not run: fallback data, or a drop above
/// `threshold` percent.
pub fn should_skip_cleanup(using_fallback: bool, drop_percent: f64, threshold: f64) -> bool {
    cleanup_gate(using_fallback, drop_percent, threshold).is_some()
}

/// [`should_skip_cleanup`] with the reason.
pub fn cleanup_gate(using_fallback: bool, drop_percent: f64, threshold: f64) -> Option<SkipReason> {
    if using_fallback {
        return Some(SkipReason::FallbackData);
    }
    if drop_percent > threshold {
        return Some(SkipReason::CountDrop {
            percent: drop_percent,
        });
    }
    None
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SyncOrchestrator {
    store: ManifestStore,
    posts_root: PathBuf,
    drop_threshold_percent: f64,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(store: ManifestStore, posts_root: impl Into<PathBuf>, drop_threshold_percent: f64) -> Self {
        Self {
            store,
            posts_root: posts_root.into(),
            drop_threshold_percent,
            dry_run: false,
        }
    }

    /// Orchestrator for a build rooted at `root`, paths and threshold taken
    /// from `config`.
    pub fn from_config(root: &Path, config: &SyncConfig) -> Self {
        Self::new(
            ManifestStore::for_root(root, config),
            config.posts_root(root),
            config.drop_threshold_percent,
        )
    }

    /// In dry run nothing on disk changes; orphans are only reported.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn posts_root(&self) -> &Path {
        &self.posts_root
    }

    pub fn sync(&self, request: SyncRequest) -> SyncOutcome {
        let previous = self.store.read_previous();
        let comparison = reconcile::compare(previous.as_ref(), &request.entities);
        info!("{}", comparison.summary);

        let previous_count = request
            .previous_entity_count
            .or_else(|| previous.as_ref().map(|m| m.total_count))
            .unwrap_or(0);
        let current_slugs = unique_slugs(&request.entities);
        let drop = drop_percent(previous_count, current_slugs.len());

        let cleanup = self.cleanup(&comparison, request.using_fallback, drop);
        let deleted_count = cleanup.report().map_or(0, |r| r.deleted_count);

        let manifest = Manifest {
            total_count: current_slugs.len(),
            post_slugs: current_slugs,
            timestamp: Utc::now(),
            category_id: request.category_id,
            category_slug: request.category_slug,
        };

        let success = if self.dry_run {
            info!(
                path = %self.store.path().display(),
                count = manifest.total_count,
                "[dry-run] would write manifest"
            );
            true
        } else {
            self.store.write(&manifest)
        };

        SyncOutcome {
            success,
            comparison,
            deleted_count,
            cleanup,
            manifest,
            dry_run: self.dry_run,
        }
    }

    fn cleanup(&self, comparison: &ManifestComparison, using_fallback: bool, drop: f64) -> CleanupStatus {
        if !comparison.has_orphans() {
            return CleanupStatus::NothingToDo;
        }
        if let Some(reason) = cleanup_gate(using_fallback, drop, self.drop_threshold_percent) {
            warn!(
                orphans = comparison.orphaned_slugs.len(),
                reason = %reason,
                "skipping cleanup of orphaned posts"
            );
            return CleanupStatus::Skipped(reason);
        }

        let report = if self.dry_run {
            cleanup::plan_orphans(&comparison.orphaned_slugs, &self.posts_root)
        } else {
            cleanup::delete_orphans(&comparison.orphaned_slugs, &self.posts_root)
        };
        if !report.is_clean() {
            warn!(
                failed = report.errors.len(),
                deleted = report.deleted_count,
                "some orphaned posts could not be cleaned up"
            );
        }
        CleanupStatus::Ran(report)
    }
}

fn unique_slugs(entities: &[ContentEntity]) -> Vec<Slug> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|e| seen.insert(&e.slug))
        .map(|e| e.slug.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, 40, 60.0)]
    #[case(10, 5, 50.0)]
    #[case(0, 5, 0.0)]
    #[case(5, 8, 0.0)]
    #[case(4, 0, 100.0)]
    fn drop_percent_cases(#[case] previous: usize, #[case] current: usize, #[case] expected: f64) {
        assert!((drop_percent(previous, current) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(true, 0.0, true)]
    #[case(true, 80.0, true)]
    #[case(false, 60.0, true)]
    #[case(false, 50.0, false)]
    #[case(false, 10.0, false)]
    fn skip_truth_table(#[case] fallback: bool, #[case] drop: f64, #[case] skip: bool) {
        assert_eq!(should_skip_cleanup(fallback, drop, 50.0), skip);
    }

    #[test]
    fn fallback_reason_wins_over_drop() {
        assert_eq!(cleanup_gate(true, 90.0, 50.0), Some(SkipReason::FallbackData));
        assert_eq!(
            cleanup_gate(false, 90.0, 50.0),
            Some(SkipReason::CountDrop { percent: 90.0 })
        );
        assert_eq!(SkipReason::CountDrop { percent: 60.0 }.to_string(), "post count dropped 60.0%");
    }
}
