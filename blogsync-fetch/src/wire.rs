//! WordPress REST payloads (`/wp/v2/posts?_embed`, `/wp/v2/categories`) and
//! their conversion into [`ContentEntity`].
//!
//! Embedded objects are flattened here; nothing outside this module sees the
//! wire shape.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use blogsync_core::{AuthorRef, ContentEntity, MediaRef, Slug, TermRef};

use crate::normalize::{clean_html_for_display, decode_html_entities, sanitize_html};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpRendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WpPost {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: WpRendered,
    #[serde(default)]
    pub content: WpRendered,
    #[serde(default)]
    pub excerpt: WpRendered,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<WpEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WpEmbedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<WpMedia>,
    #[serde(rename = "wp:term", default)]
    pub terms: Vec<Vec<WpTerm>>,
    #[serde(default)]
    pub author: Vec<WpAuthor>,
}

/// Embedded media; WordPress embeds an error object instead when the image is
/// private, so every field is optional.
#[derive(Debug, Deserialize)]
pub(crate) struct WpMedia {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub alt_text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WpTerm {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WpAuthor {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_urls: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WpCategory {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl WpCategory {
    pub fn into_term(self) -> TermRef {
        TermRef {
            id: self.id,
            name: decode_html_entities(&self.name),
            slug: self.slug,
        }
    }
}

/// Which category to leave out of a post's taxonomy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Exclude<'a> {
    pub slug: &'a str,
    pub id: Option<u64>,
}

impl Exclude<'_> {
    fn matches(&self, term: &WpTerm) -> bool {
        term.slug == self.slug || self.id == Some(term.id)
    }
}

impl WpPost {
    pub fn into_entity(self, exclude: Exclude<'_>) -> ContentEntity {
        let embedded = self.embedded.unwrap_or_default();

        let featured_media = embedded.featured_media.into_iter().next().and_then(|m| {
            let url = m.source_url.filter(|u| !u.is_empty())?;
            Some(MediaRef {
                id: m.id,
                url,
                alt: decode_html_entities(&m.alt_text),
            })
        });

        let mut categories = Vec::new();
        let mut tags = Vec::new();
        for (group, terms) in embedded.terms.into_iter().enumerate() {
            for term in terms {
                let taxonomy = term.taxonomy.clone().unwrap_or_else(|| {
                    match group {
                        0 => "category",
                        1 => "post_tag",
                        _ => "",
                    }
                    .to_string()
                });
                match taxonomy.as_str() {
                    "category" if !exclude.matches(&term) => categories.push(to_term_ref(term)),
                    "post_tag" => tags.push(to_term_ref(term)),
                    _ => {}
                }
            }
        }

        let author = embedded
            .author
            .into_iter()
            .next()
            .filter(|a| a.id != 0 || !a.name.is_empty())
            .map(|a| AuthorRef {
                id: a.id,
                name: decode_html_entities(&a.name),
                avatar: a.avatar_urls.get("96").cloned().unwrap_or_default(),
            });

        let date = parse_wp_date(self.date_gmt.as_deref().or(self.date.as_deref()));
        let modified = parse_wp_date(self.modified_gmt.as_deref().or(self.modified.as_deref()));

        ContentEntity {
            id: self.id,
            slug: Slug::from(self.slug),
            title: decode_html_entities(&self.title.rendered),
            content: sanitize_html(&self.content.rendered),
            excerpt: clean_html_for_display(&sanitize_html(&self.excerpt.rendered)),
            date,
            modified,
            featured_media,
            categories,
            tags,
            author,
        }
    }
}

fn to_term_ref(term: WpTerm) -> TermRef {
    TermRef {
        id: term.id,
        name: decode_html_entities(&term.name),
        slug: term.slug,
    }
}

/// WordPress dates are `YYYY-MM-DDTHH:MM:SS` without offset; `*_gmt` fields
/// are UTC. RFC 3339 is accepted too.
pub(crate) fn parse_wp_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DateTime::<Utc>::default();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        Ok(naive) => naive.and_utc(),
        Err(err) => {
            tracing::debug!(value = raw, error = %err, "unparseable WordPress date");
            DateTime::<Utc>::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const POST: &str = r#"{
        "id": 101,
        "slug": "hello-world",
        "title": {"rendered": "Hello &amp; welcome"},
        "content": {"rendered": "<p onclick=\"x()\">Body</p><script>bad()</script>"},
        "excerpt": {"rendered": "<p>Short &hellip;</p>\n"},
        "date": "2024-05-01T09:00:00",
        "date_gmt": "2024-05-01T07:00:00",
        "modified": "2024-05-02T09:00:00",
        "featured_media": 9,
        "categories": [14, 3],
        "tags": [8],
        "_embedded": {
            "wp:featuredmedia": [{"id": 9, "source_url": "https://cdn/x.jpg", "alt_text": "A &quot;cat&quot;"}],
            "wp:term": [
                [
                    {"id": 14, "name": "Astrobot.design", "slug": "astrobot-design", "taxonomy": "category"},
                    {"id": 3, "name": "Design &amp; UX", "slug": "design", "taxonomy": "category"}
                ],
                [{"id": 8, "name": "Speed", "slug": "speed", "taxonomy": "post_tag"}]
            ],
            "author": [{"id": 2, "name": "Ada", "avatar_urls": {"24": "s", "96": "https://avatar/96"}}]
        }
    }"#;

    fn exclude() -> Exclude<'static> {
        Exclude {
            slug: "astrobot-design",
            id: Some(14),
        }
    }

    #[test]
    fn flattens_embedded_objects() {
        let post: WpPost = serde_json::from_str(POST).unwrap();
        let entity = post.into_entity(exclude());

        assert_eq!(entity.slug, Slug::from("hello-world"));
        assert_eq!(entity.title, "Hello & welcome");
        assert_eq!(entity.content, "<p>Body</p>");
        assert_eq!(entity.excerpt, "Short …");
        assert_eq!(entity.date, Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
        assert_eq!(entity.modified, Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap());

        let media = entity.featured_media.expect("media");
        assert_eq!(media.url, "https://cdn/x.jpg");
        assert_eq!(media.alt, "A \"cat\"");

        assert_eq!(entity.categories.len(), 1, "filter category excluded");
        assert_eq!(entity.categories[0].name, "Design & UX");
        assert_eq!(entity.tags[0].slug, "speed");

        let author = entity.author.expect("author");
        assert_eq!(author.name, "Ada");
        assert_eq!(author.avatar, "https://avatar/96");
    }

    #[test]
    fn minimal_post_without_embeds() {
        let post: WpPost =
            serde_json::from_str(r#"{"id": 1, "slug": "bare", "title": {"rendered": "Bare"}}"#)
                .unwrap();
        let entity = post.into_entity(exclude());
        assert!(entity.featured_media.is_none());
        assert!(entity.author.is_none());
        assert!(entity.categories.is_empty());
        assert_eq!(entity.date, DateTime::<Utc>::default());
    }

    #[test]
    fn media_error_object_is_treated_as_absent() {
        let post: WpPost = serde_json::from_str(
            r#"{"id": 1, "slug": "s", "_embedded": {"wp:featuredmedia": [{"code": "rest_forbidden"}]}}"#,
        )
        .unwrap();
        assert!(post.into_entity(exclude()).featured_media.is_none());
    }

    #[test]
    fn terms_without_taxonomy_use_group_position() {
        let post: WpPost = serde_json::from_str(
            r#"{"id": 1, "slug": "s", "_embedded": {"wp:term": [
                [{"id": 5, "name": "News", "slug": "news"}],
                [{"id": 6, "name": "Rust", "slug": "rust"}]
            ]}}"#,
        )
        .unwrap();
        let entity = post.into_entity(exclude());
        assert_eq!(entity.categories[0].slug, "news");
        assert_eq!(entity.tags[0].slug, "rust");
    }

    #[test]
    fn date_parsing_variants() {
        let expected = Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_wp_date(Some("2023-12-15T00:00:00")), expected);
        assert_eq!(parse_wp_date(Some("2023-12-15T01:00:00+01:00")), expected);
        assert_eq!(parse_wp_date(Some("garbage")), DateTime::<Utc>::default());
        assert_eq!(parse_wp_date(None), DateTime::<Utc>::default());
    }
}
