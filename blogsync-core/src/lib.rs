//! blogsync core library: domain types, configuration, errors.
//!
//! - [`types`]: posts, references, manifest, content source
//! - [`config`]: [`SyncConfig`] resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::SyncConfig;
pub use error::ConfigError;
pub use types::{
    AuthorRef, CategoryFilter, CategoryResolution, ContentEntity, ContentSource, FallbackReason,
    Manifest, MediaRef, Slug, TermRef,
};
