//! Reconciler: diff the previous manifest against the current posts.
//!
//! Pure and deterministic. Duplicates on either side collapse to their first
//! occurrence; bucket order follows the input order (`new` and `unchanged` in
//! current order, `orphaned` in previous order).

use std::collections::HashSet;

use blogsync_core::{ContentEntity, Manifest, Slug};

/// Three disjoint slug buckets plus a one-line summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestComparison {
    /// In current, not in previous.
    pub new_slugs: Vec<Slug>,
    /// In previous, not in current. Candidates for cleanup.
    pub orphaned_slugs: Vec<Slug>,
    /// In both.
    pub unchanged_slugs: Vec<Slug>,
    pub summary: String,
}

impl ManifestComparison {
    pub fn has_orphans(&self) -> bool {
        !self.orphaned_slugs.is_empty()
    }
}

/// Compare a previous snapshot (if any) with the posts fetched this build.
pub fn compare(previous: Option<&Manifest>, current: &[ContentEntity]) -> ManifestComparison {
    let current: Vec<Slug> = current.iter().map(|e| e.slug.clone()).collect();
    compare_slugs(previous.map(|m| m.post_slugs.as_slice()), &current)
}

/// [`compare`] over plain slug lists. `previous: None` means first build.
pub fn compare_slugs(previous: Option<&[Slug]>, current: &[Slug]) -> ManifestComparison {
    let current = dedup(current);

    let Some(previous) = previous else {
        let summary = format!("Initial build: {} posts to create", current.len());
        return ManifestComparison {
            new_slugs: current,
            orphaned_slugs: Vec::new(),
            unchanged_slugs: Vec::new(),
            summary,
        };
    };

    let previous = dedup(previous);
    let previous_set: HashSet<&Slug> = previous.iter().collect();
    let current_set: HashSet<&Slug> = current.iter().collect();

    let (unchanged_slugs, new_slugs): (Vec<Slug>, Vec<Slug>) = current
        .iter()
        .cloned()
        .partition(|slug| previous_set.contains(slug));
    let orphaned_slugs: Vec<Slug> = previous
        .iter()
        .filter(|slug| !current_set.contains(slug))
        .cloned()
        .collect();

    let summary = change_summary(unchanged_slugs.len(), new_slugs.len(), orphaned_slugs.len());
    ManifestComparison {
        new_slugs,
        orphaned_slugs,
        unchanged_slugs,
        summary,
    }
}

fn change_summary(unchanged: usize, new: usize, removed: usize) -> String {
    let mut parts = Vec::new();
    if unchanged > 0 {
        parts.push(format!("{unchanged} unchanged"));
    }
    if new > 0 {
        parts.push(format!("+{new} new"));
    }
    if removed > 0 {
        parts.push(format!("-{removed} removed"));
    }
    if parts.is_empty() {
        return "Post changes: none".to_string();
    }
    format!("Post changes: {}", parts.join(", "))
}

fn dedup(slugs: &[Slug]) -> Vec<Slug> {
    let mut seen = HashSet::new();
    slugs
        .iter()
        .filter(|slug| seen.insert(*slug))
        .cloned()
        .collect()
}
