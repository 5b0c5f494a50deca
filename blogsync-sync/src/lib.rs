//! # blogsync-sync
//!
//! Manifest persistence, reconciliation, and orphan cleanup.
//!
//! Build a [`SyncOrchestrator`] and call [`SyncOrchestrator::sync`] once per
//! build with the posts the fetcher returned.
//!
//! - [`manifest_store`]: atomic JSON snapshot of the last sync
//! - [`reconcile`]: new / unchanged / orphaned slug buckets
//! - [`cleanup`]: safe removal of orphaned output directories
//! - [`orchestrator`]: sequencing and the cleanup safety gate

pub mod cleanup;
pub mod error;
pub mod manifest_store;
pub mod orchestrator;
pub mod reconcile;

pub use cleanup::{delete_orphans, CleanupError, CleanupReport};
pub use error::SyncError;
pub use manifest_store::ManifestStore;
pub use orchestrator::{
    cleanup_gate, drop_percent, should_skip_cleanup, CleanupStatus, SkipReason, SyncOrchestrator,
    SyncOutcome, SyncRequest,
};
pub use reconcile::{compare, compare_slugs, ManifestComparison};
