//! End-to-end sync passes against a temporary build root.

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use blogsync_core::{ContentEntity, Manifest, Slug};
use blogsync_sync::{
    delete_orphans, CleanupStatus, ManifestStore, SkipReason, SyncOrchestrator, SyncRequest,
};

fn entity(slug: &str) -> ContentEntity {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    ContentEntity {
        id: 1,
        slug: Slug::from(slug),
        title: slug.to_string(),
        content: String::new(),
        excerpt: String::new(),
        date,
        modified: date,
        featured_media: None,
        categories: vec![],
        tags: vec![],
        author: None,
    }
}

fn entities(slugs: &[&str]) -> Vec<ContentEntity> {
    slugs.iter().map(|s| entity(s)).collect()
}

fn slugs(list: &[&str]) -> Vec<Slug> {
    list.iter().map(|s| Slug::from(*s)).collect()
}

struct Site {
    _tmp: TempDir,
    store: ManifestStore,
    posts_root: std::path::PathBuf,
}

impl Site {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tmp");
        let store = ManifestStore::at(tmp.path().join(".wordpress-posts-manifest.json"));
        let posts_root = tmp.path().join("dist").join("blog");
        fs::create_dir_all(&posts_root).expect("mkdir");
        Self {
            _tmp: tmp,
            store,
            posts_root,
        }
    }

    fn with_previous(self, previous: &[&str]) -> Self {
        let manifest = Manifest {
            post_slugs: slugs(previous),
            timestamp: Utc::now(),
            total_count: previous.len(),
            category_id: 14,
            category_slug: "astrobot-design".to_string(),
        };
        self.store.save(&manifest).expect("seed manifest");
        for slug in previous {
            let dir = self.posts_root.join(slug);
            fs::create_dir_all(&dir).expect("mkdir post");
            fs::write(dir.join("index.html"), "<html></html>").expect("write post");
        }
        self
    }

    fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(self.store.clone(), &self.posts_root, 50.0)
    }

    fn has_output(&self, slug: &str) -> bool {
        self.posts_root.join(slug).exists()
    }
}

fn request(current: &[&str], using_fallback: bool) -> SyncRequest {
    SyncRequest {
        entities: entities(current),
        category_id: 14,
        category_slug: "astrobot-design".to_string(),
        using_fallback,
        previous_entity_count: None,
    }
}

#[test]
fn orphans_are_removed_and_manifest_rewritten() {
    let site = Site::new().with_previous(&["a", "b", "c"]);

    let outcome = site.orchestrator().sync(request(&["b", "c", "d"], false));

    assert!(outcome.success);
    assert_eq!(outcome.comparison.new_slugs, slugs(&["d"]));
    assert_eq!(outcome.comparison.orphaned_slugs, slugs(&["a"]));
    assert_eq!(outcome.comparison.unchanged_slugs, slugs(&["b", "c"]));
    assert_eq!(outcome.deleted_count, 1);
    assert!(!site.has_output("a"));
    assert!(site.has_output("b"));

    let saved = site.store.load().unwrap().unwrap();
    assert_eq!(saved.post_slugs, slugs(&["b", "c", "d"]));
    assert_eq!(saved.total_count, 3);
}

#[test]
fn first_build_creates_manifest() {
    let site = Site::new();

    let outcome = site.orchestrator().sync(request(&["x", "y"], false));

    assert!(outcome.success);
    assert_eq!(outcome.comparison.new_slugs, slugs(&["x", "y"]));
    assert!(outcome.comparison.orphaned_slugs.is_empty());
    assert_eq!(outcome.comparison.summary, "Initial build: 2 posts to create");
    assert!(matches!(outcome.cleanup, CleanupStatus::NothingToDo));
    assert_eq!(site.store.load().unwrap().unwrap().post_slugs, slugs(&["x", "y"]));
}

#[test]
fn sharp_drop_skips_cleanup_but_rewrites_manifest() {
    let previous: Vec<String> = (0..100).map(|i| format!("post-{i}")).collect();
    let previous: Vec<&str> = previous.iter().map(String::as_str).collect();
    let site = Site::new().with_previous(&previous);

    let outcome = site.orchestrator().sync(request(&previous[..40], false));

    assert!(outcome.success);
    match outcome.cleanup {
        CleanupStatus::Skipped(SkipReason::CountDrop { percent }) => {
            assert!((percent - 60.0).abs() < 1e-9)
        }
        other => panic!("expected count-drop skip, got {other:?}"),
    }
    assert_eq!(outcome.deleted_count, 0);
    assert!(site.has_output("post-99"));
    assert_eq!(site.store.load().unwrap().unwrap().total_count, 40);
}

#[test]
fn fallback_data_never_deletes() {
    let site = Site::new().with_previous(&["live-1", "live-2"]);

    let outcome = site
        .orchestrator()
        .sync(request(&["what-is-astro", "test", "seo-benefits"], true));

    assert!(outcome.success);
    assert!(matches!(
        outcome.cleanup,
        CleanupStatus::Skipped(SkipReason::FallbackData)
    ));
    assert!(site.has_output("live-1"));
    assert!(site.has_output("live-2"));
}

#[test]
fn explicit_previous_count_overrides_manifest() {
    let site = Site::new().with_previous(&["a", "b"]);
    let mut req = request(&["a"], false);
    req.previous_entity_count = Some(10);

    // 10 -> 1 is a 90% drop even though the manifest only held two slugs.
    let outcome = site.orchestrator().sync(req);

    assert!(matches!(
        outcome.cleanup,
        CleanupStatus::Skipped(SkipReason::CountDrop { .. })
    ));
    assert!(site.has_output("b"));
}

#[test]
fn cleanup_failures_do_not_fail_the_sync() {
    let site = Site::new().with_previous(&["good"]);
    // Hand-edited manifest with a path-escaping slug alongside a real one.
    let manifest = Manifest {
        post_slugs: slugs(&["good", "../escape", "keep"]),
        timestamp: Utc::now(),
        total_count: 3,
        category_id: 14,
        category_slug: "astrobot-design".to_string(),
    };
    site.store.save(&manifest).unwrap();

    let outcome = site
        .orchestrator()
        .sync(request(&["keep", "new-1", "new-2"], false));

    assert!(outcome.success);
    let report = outcome.cleanup.report().expect("cleanup ran");
    assert_eq!(report.deleted_count, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, Slug::from("../escape"));
    assert!(!site.has_output("good"));
}

#[test]
fn dry_run_changes_nothing() {
    let site = Site::new().with_previous(&["a", "b"]);
    let before = fs::read_to_string(site.store.path()).unwrap();

    let outcome = site.orchestrator().dry_run(true).sync(request(&["b"], false));

    assert!(outcome.success);
    assert!(outcome.dry_run);
    assert_eq!(outcome.deleted_count, 0);
    let report = outcome.cleanup.report().expect("planned");
    assert_eq!(report.would_delete, vec![site.posts_root.join("a")]);
    assert!(site.has_output("a"));
    assert_eq!(fs::read_to_string(site.store.path()).unwrap(), before);
    assert_eq!(outcome.manifest.post_slugs, slugs(&["b"]));
}

#[test]
fn unwritable_manifest_is_the_only_failure() {
    let tmp = TempDir::new().unwrap();
    let manifest_path = tmp.path().join("manifest.json");
    fs::create_dir_all(manifest_path.join("blocker")).unwrap();
    let orchestrator = SyncOrchestrator::new(ManifestStore::at(&manifest_path), tmp.path(), 50.0);

    let outcome = orchestrator.sync(request(&["a"], false));

    assert!(!outcome.success);
    assert_eq!(outcome.comparison.new_slugs, slugs(&["a"]));
}

#[test]
fn duplicate_current_slugs_collapse_in_manifest() {
    let site = Site::new();
    let outcome = site.orchestrator().sync(request(&["a", "a", "b"], false));
    assert_eq!(outcome.manifest.post_slugs, slugs(&["a", "b"]));
    assert_eq!(outcome.manifest.total_count, 2);
}

#[test]
fn deleting_missing_directories_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let root: &Path = tmp.path();
    let gone = slugs(&["never-built", "also-missing"]);

    for _ in 0..2 {
        let report = delete_orphans(&gone, root);
        assert_eq!(report.deleted_count, 0);
        assert!(report.errors.is_empty());
    }
    let empty = delete_orphans(&[], root);
    assert_eq!(empty.deleted_count, 0);
    assert!(empty.errors.is_empty());
}

#[test]
fn manifest_roundtrips_through_store() {
    let site = Site::new();
    let manifest = Manifest {
        post_slugs: slugs(&["one", "two"]),
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
        total_count: 2,
        category_id: 14,
        category_slug: "astrobot-design".to_string(),
    };
    assert!(site.store.write(&manifest));
    assert_eq!(site.store.read_previous(), Some(manifest));

    let raw = fs::read_to_string(site.store.path()).unwrap();
    assert!(raw.contains("\"postSlugs\""));
    assert!(raw.contains("\"totalCount\": 2"));
}
