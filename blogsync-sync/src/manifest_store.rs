//! Manifest store: the on-disk snapshot of slugs from the last sync.
//!
//! Persists a [`Manifest`] JSON document at
//! `<root>/.wordpress-posts-manifest.json` (camelCase keys). Writes go to
//! `<path>.tmp` and are renamed into place, so a crash mid-write never leaves
//! a truncated manifest behind.
//!
//! [`ManifestStore::load`] / [`ManifestStore::save`] are the fallible
//! primitives. [`ManifestStore::read_previous`] / [`ManifestStore::write`]
//! wrap them for the sync path, where every failure degrades to a log line.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use blogsync_core::{Manifest, SyncConfig};

use crate::error::{io_err, json_err, SyncError};

/// Owns the manifest file at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured manifest location under the build root.
    pub fn for_root(root: &Path, config: &SyncConfig) -> Self {
        Self::at(config.manifest_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    // -----------------------------------------------------------------------
    // Fallible primitives
    // -----------------------------------------------------------------------

    /// Load the manifest. `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<Manifest>, SyncError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(&self.path, err)),
        };
        let manifest: Manifest =
            serde_json::from_str(&contents).map_err(|e| json_err(&self.path, e))?;
        if !manifest.is_consistent() {
            return Err(SyncError::Inconsistent {
                path: self.path.clone(),
                total_count: manifest.total_count,
                slugs: manifest.post_slugs.len(),
            });
        }
        Ok(Some(manifest))
    }

    /// Save the manifest atomically: write `<path>.tmp`, then rename.
    pub fn save(&self, manifest: &Manifest) -> Result<(), SyncError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let json = serde_json::to_string_pretty(manifest).map_err(|e| json_err(&self.path, e))?;
        let tmp = self.tmp_path();
        let saved = std::fs::write(&tmp, json)
            .map_err(|e| io_err(&tmp, e))
            .and_then(|()| std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e)));
        if saved.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        saved
    }

    // -----------------------------------------------------------------------
    // Degrading wrappers
    // -----------------------------------------------------------------------

    /// The previous snapshot, or `None` on first build or when the file
    /// cannot be trusted. Never fails.
    pub fn read_previous(&self) -> Option<Manifest> {
        match self.load() {
            Ok(Some(manifest)) => {
                debug!(
                    path = %self.path.display(),
                    count = manifest.total_count,
                    "loaded previous manifest"
                );
                Some(manifest)
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no previous manifest; first build");
                None
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable manifest; treating as first build");
                None
            }
        }
    }

    /// Persist `manifest`; `false` (with an error log) when it could not be
    /// written.
    pub fn write(&self, manifest: &Manifest) -> bool {
        match self.save(manifest) {
            Ok(()) => {
                info!(
                    path = %self.path.display(),
                    count = manifest.total_count,
                    "manifest saved"
                );
                true
            }
            Err(err) => {
                error!(error = %err, "failed to write manifest");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogsync_core::Slug;
    use chrono::Utc;
    use tempfile::TempDir;

    fn manifest(slugs: &[&str]) -> Manifest {
        Manifest {
            post_slugs: slugs.iter().map(|s| Slug::from(*s)).collect(),
            timestamp: Utc::now(),
            total_count: slugs.len(),
            category_id: 14,
            category_slug: "astrobot-design".to_string(),
        }
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::at(tmp.path().join("m.json"));
        assert!(store.load().unwrap().is_none());
        assert!(store.read_previous().is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::at(tmp.path().join("m.json"));
        let m = manifest(&["a", "b"]);
        assert!(store.write(&m));
        assert_eq!(store.read_previous(), Some(m));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::at(tmp.path().join("m.json"));
        store.save(&manifest(&["a"])).unwrap();
        assert!(!tmp.path().join("m.json.tmp").exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = ManifestStore::at(tmp.path().join("nested/dir/m.json"));
        assert!(store.write(&manifest(&[])));
        assert!(store.path().exists());
    }

    #[test]
    fn malformed_json_degrades_to_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ManifestStore::at(&path);
        assert!(matches!(store.load(), Err(SyncError::Json { .. })));
        assert!(store.read_previous().is_none());
    }

    #[test]
    fn inconsistent_count_degrades_to_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.json");
        let mut m = manifest(&["a", "b"]);
        m.total_count = 5;
        std::fs::write(&path, serde_json::to_string(&m).unwrap()).unwrap();
        let store = ManifestStore::at(&path);
        assert!(matches!(
            store.load(),
            Err(SyncError::Inconsistent { total_count: 5, slugs: 2, .. })
        ));
        assert!(store.read_previous().is_none());
    }

    #[test]
    fn unwritable_target_reports_false() {
        let tmp = TempDir::new().unwrap();
        // The target path is an existing directory, so rename onto it fails.
        let path = tmp.path().join("m.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let store = ManifestStore::at(&path);
        assert!(!store.write(&manifest(&["a"])));
        assert!(!tmp.path().join("m.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_tmp_write_removes_tmp_file() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.json");
        let tmp_file = tmp.path().join("m.json.tmp");
        // Writes through this link fail with ENOSPC after the file is opened.
        std::os::unix::fs::symlink(full, &tmp_file).unwrap();
        let store = ManifestStore::at(&path);

        let err = store.save(&manifest(&["a"])).unwrap_err();

        assert!(matches!(err, SyncError::Io { ref path, .. } if path == &tmp_file), "{err:?}");
        assert!(tmp_file.symlink_metadata().is_err());
        assert!(!path.exists());
    }
}
