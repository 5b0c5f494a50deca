//! Roundtrip serialisation tests for `blogsync-core` types.
//!
//! Each `#[case]` is isolated with no shared state.

use blogsync_core::types::{
    AuthorRef, ContentEntity, ContentSource, FallbackReason, Manifest, MediaRef, Slug, TermRef,
};
use chrono::{TimeZone, Utc};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minimal_post() -> ContentEntity {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    ContentEntity {
        id: 1,
        slug: Slug::from("minimal"),
        title: "Minimal".to_string(),
        content: String::new(),
        excerpt: String::new(),
        date: at,
        modified: at,
        featured_media: None,
        categories: vec![],
        tags: vec![],
        author: None,
    }
}

fn full_post() -> ContentEntity {
    ContentEntity {
        id: 42,
        slug: Slug::from("full-post"),
        title: "Everything set".to_string(),
        content: "<p>Body</p>".to_string(),
        excerpt: "Body".to_string(),
        date: Utc.with_ymd_and_hms(2023, 12, 15, 9, 30, 0).unwrap(),
        modified: Utc.with_ymd_and_hms(2023, 12, 16, 10, 0, 0).unwrap(),
        featured_media: Some(MediaRef {
            id: 9,
            url: "https://cdn.example.com/a.jpg".to_string(),
            alt: "An image".to_string(),
        }),
        categories: vec![TermRef {
            id: 2,
            name: "Frameworks".to_string(),
            slug: "frameworks".to_string(),
        }],
        tags: vec![TermRef {
            id: 3,
            name: "Speed".to_string(),
            slug: "speed".to_string(),
        }],
        author: Some(AuthorRef {
            id: 5,
            name: "Writer".to_string(),
            avatar: "https://i.example.com/96.png".to_string(),
        }),
    }
}

fn unicode_post() -> ContentEntity {
    ContentEntity {
        title: "Ünïcödé — 日本語 & <tags>".to_string(),
        slug: Slug::from("unicode-投稿"),
        ..minimal_post()
    }
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip test
// ---------------------------------------------------------------------------

#[rstest]
#[case("minimal", minimal_post())]
#[case("all_fields", full_post())]
#[case("unicode_strings", unicode_post())]
fn entity_roundtrip(#[case] label: &str, #[case] post: ContentEntity) {
    let json = serde_json::to_string(&post)
        .unwrap_or_else(|e| panic!("[{label}] serialize failed: {e}"));
    let back: ContentEntity = serde_json::from_str(&json)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert_eq!(post, back, "[{label}] entity");
}

#[rstest]
#[case(vec![])]
#[case(vec![minimal_post()])]
#[case(vec![minimal_post(), full_post(), unicode_post()])]
fn manifest_roundtrip(#[case] posts: Vec<ContentEntity>) {
    let manifest = Manifest::from_entities(&posts, 17, "astrobot-design");
    let json = serde_json::to_string_pretty(&manifest).expect("serialize");
    let back: Manifest = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(manifest, back);
    assert!(back.is_consistent());
}

#[test]
fn legacy_manifest_layout_parses() {
    let json = r#"{
  "postSlugs": ["what-is-astro", "test"],
  "timestamp": "2025-03-01T12:00:00.000Z",
  "totalCount": 2,
  "categoryId": 14,
  "categorySlug": "astrobot-design"
}"#;
    let manifest: Manifest = serde_json::from_str(json).expect("parse");
    assert_eq!(manifest.post_slugs[1], Slug::from("test"));
    assert_eq!(manifest.category_id, 14);
    assert!(manifest.is_consistent());
}

#[rstest]
#[case(ContentSource::Remote)]
#[case(ContentSource::Fallback(FallbackReason::FetchUnavailable))]
#[case(ContentSource::Fallback(FallbackReason::InvalidResponse))]
#[case(ContentSource::Fallback(FallbackReason::NotFoundRemotely))]
fn content_source_roundtrip(#[case] source: ContentSource) {
    let json = serde_json::to_string(&source).expect("serialize");
    let back: ContentSource = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(source, back);
}
