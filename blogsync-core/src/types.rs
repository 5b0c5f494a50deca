//! Domain types shared by the fetcher, the sync pipeline, and the CLI.
//!
//! All types are serializable via serde. [`Manifest`] keeps the camelCase key
//! layout of `.wordpress-posts-manifest.json` so snapshots written by earlier
//! site builds still load.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// URL-safe identifier of a post; the join key across builds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Slug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Slug {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Embedded references
// ---------------------------------------------------------------------------

/// A category or tag copied into a post at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Author details copied into a post at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: u64,
    pub name: String,
    /// 96px avatar URL, empty when WordPress did not provide one.
    pub avatar: String,
}

/// Featured image copied into a post at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: u64,
    pub url: String,
    pub alt: String,
}

// ---------------------------------------------------------------------------
// Content entity
// ---------------------------------------------------------------------------

/// A normalized blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: u64,
    pub slug: Slug,
    /// Plain text, entities decoded.
    pub title: String,
    /// Sanitized HTML.
    pub content: String,
    /// Plain text, tags stripped and entities decoded.
    pub excerpt: String,
    pub date: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<MediaRef>,
    #[serde(default)]
    pub categories: Vec<TermRef>,
    #[serde(default)]
    pub tags: Vec<TermRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
}

// ---------------------------------------------------------------------------
// Category filter
// ---------------------------------------------------------------------------

/// How the filtering category id was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryResolution {
    /// Category slug matched the configured slug exactly.
    Exact,
    /// Category slug matched one of the configured aliases.
    Alias,
    /// Category name contained the configured name hint.
    NameMatch,
    /// The caller supplied the id directly.
    Configured,
    /// Lookup failed or found nothing; the configured fallback id is used.
    Fallback,
}

impl fmt::Display for CategoryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryResolution::Exact => write!(f, "exact"),
            CategoryResolution::Alias => write!(f, "alias"),
            CategoryResolution::NameMatch => write!(f, "name-match"),
            CategoryResolution::Configured => write!(f, "configured"),
            CategoryResolution::Fallback => write!(f, "category-fallback"),
        }
    }
}

/// The category posts are filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub id: u64,
    pub slug: String,
    pub resolution: CategoryResolution,
}

// ---------------------------------------------------------------------------
// Content source
// ---------------------------------------------------------------------------

/// Why the local fallback dataset was served instead of live content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Network failure persisted through every retry, or a non-retryable
    /// failure (HTTP status, unknown transport error).
    FetchUnavailable,
    /// The remote answered but the body could not be decoded.
    InvalidResponse,
    /// Single-post lookup: the remote had no such slug.
    NotFoundRemotely,
}

impl FallbackReason {
    /// Tier name used in build logs.
    pub fn tier(self) -> &'static str {
        match self {
            FallbackReason::FetchUnavailable => "fetch-unavailable",
            FallbackReason::InvalidResponse => "invalid-response",
            FallbackReason::NotFoundRemotely => "slug-fallback",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tier())
    }
}

/// Where a batch of entities came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum ContentSource {
    Remote,
    Fallback(FallbackReason),
}

impl ContentSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ContentSource::Fallback(_))
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Remote => write!(f, "live"),
            ContentSource::Fallback(reason) => write!(f, "fallback ({reason})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Snapshot of the slugs present after the last successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub post_slugs: Vec<Slug>,
    pub timestamp: DateTime<Utc>,
    pub total_count: usize,
    pub category_id: u64,
    pub category_slug: String,
}

impl Manifest {
    /// Build a snapshot of `entities`, stamped with the current time.
    pub fn from_entities(entities: &[ContentEntity], category_id: u64, category_slug: &str) -> Self {
        let post_slugs: Vec<Slug> = entities.iter().map(|e| e.slug.clone()).collect();
        Self {
            total_count: post_slugs.len(),
            post_slugs,
            timestamp: Utc::now(),
            category_id,
            category_slug: category_slug.to_owned(),
        }
    }

    /// `total_count` agrees with the slug list.
    pub fn is_consistent(&self) -> bool {
        self.total_count == self.post_slugs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(slug: &str) -> ContentEntity {
        let now = Utc::now();
        ContentEntity {
            id: 7,
            slug: Slug::from(slug),
            title: "t".to_string(),
            content: String::new(),
            excerpt: String::new(),
            date: now,
            modified: now,
            featured_media: None,
            categories: vec![],
            tags: vec![],
            author: None,
        }
    }

    #[test]
    fn slug_display_and_equality() {
        assert_eq!(Slug::from("hello").to_string(), "hello");
        assert_eq!(Slug::from("x"), Slug::from(String::from("x")));
    }

    #[test]
    fn manifest_from_entities_keeps_count_in_step() {
        let m = Manifest::from_entities(&[entity("a"), entity("b")], 12, "astrobot-design");
        assert_eq!(m.total_count, 2);
        assert_eq!(m.post_slugs, vec![Slug::from("a"), Slug::from("b")]);
        assert_eq!(m.category_id, 12);
        assert!(m.is_consistent());
    }

    #[test]
    fn manifest_uses_camel_case_keys() {
        let m = Manifest::from_entities(&[entity("a")], 3, "cat");
        let json = serde_json::to_value(&m).expect("serialize");
        for key in ["postSlugs", "timestamp", "totalCount", "categoryId", "categorySlug"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["postSlugs"][0], "a");
    }

    #[test]
    fn content_source_fallback_flag() {
        assert!(!ContentSource::Remote.is_fallback());
        assert!(ContentSource::Fallback(FallbackReason::InvalidResponse).is_fallback());
        assert_eq!(
            ContentSource::Fallback(FallbackReason::FetchUnavailable).to_string(),
            "fallback (fetch-unavailable)"
        );
    }
}
