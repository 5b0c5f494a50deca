//! Local content served when WordPress cannot be reached.
//!
//! [`FallbackDataset`] is an immutable value handed to the fetcher at
//! construction. [`FallbackDataset::builtin`] builds it from a static table.

use chrono::{DateTime, TimeZone, Utc};

use blogsync_core::{AuthorRef, ContentEntity, MediaRef, Slug, TermRef};

struct FallbackPost {
    id: u64,
    slug: &'static str,
    title: &'static str,
    content: &'static str,
    excerpt: &'static str,
    date: (i32, u32, u32),
    modified: (i32, u32, u32),
    media: (&'static str, &'static str),
    categories: &'static [(u64, &'static str, &'static str)],
    tags: &'static [(u64, &'static str, &'static str)],
    author: (u64, &'static str, &'static str),
}

static BUILTIN_POSTS: &[FallbackPost] = &[
    FallbackPost {
        id: 1,
        slug: "what-is-astro",
        title: "What is Astro and Why It's Perfect for Your Business Website",
        content: "<p>Astro is a modern web framework for building fast, content-focused websites. \
                  Its islands architecture ships only the JavaScript a page actually needs.</p>\
                  <h2>Zero JavaScript by Default</h2>\
                  <p>Pages render to static HTML, which keeps business sites fast.</p>\
                  <h2>Use Any UI Framework</h2>\
                  <p>React, Vue, Svelte, or none at all: teams keep the tools they know.</p>\
                  <h2>Built for SEO</h2>\
                  <p>Static generation produces pages search engines crawl quickly.</p>",
        excerpt: "Discover why Astro is the perfect framework for building your business website \
                  with its zero-JavaScript-by-default approach and incredible speed.",
        date: (2023, 12, 15),
        modified: (2023, 12, 16),
        media: (
            "https://plus.unsplash.com/premium_photo-1681487764745-a3b7f2841bec?q=80&w=2070&auto=format&fit=crop",
            "Astro framework visualization",
        ),
        categories: &[(2, "Frameworks", "frameworks"), (3, "Web Development", "web-development")],
        tags: &[(1, "Performance", "performance"), (2, "Jamstack", "jamstack")],
        author: (1, "Astro Developer", "https://i.pravatar.cc/96?img=1"),
    },
    FallbackPost {
        id: 2,
        slug: "test",
        title: "75% Faster: How Static Site Generation Boosts Business Websites",
        content: "<p>Traditional WordPress websites are slowing your business down.</p>\
                  <h2>The Problem with Traditional Sites</h2>\
                  <p>Dynamic pages are assembled on every request, and the delay costs conversions.</p>\
                  <h2>The Static Site Advantage</h2>\
                  <p>Pre-rendered HTML is delivered as-is, with no per-request processing.</p>\
                  <h2>Real-World Results</h2>\
                  <p>Migrated sites have seen average speed improvements of 75%.</p>",
        excerpt: "Discover how migrating from traditional WordPress to static site generation \
                  can make your business website up to 75% faster, improving SEO and conversions.",
        date: (2023, 11, 28),
        modified: (2023, 11, 30),
        media: (
            "https://images.unsplash.com/photo-1614741118887-7a4ee193a5fa?q=80&w=2187&auto=format&fit=crop",
            "Speed visualization with light trails",
        ),
        categories: &[(4, "Performance", "performance"), (5, "Business", "business")],
        tags: &[(3, "Speed", "speed"), (4, "WordPress", "wordpress")],
        author: (2, "Performance Expert", "https://i.pravatar.cc/96?img=2"),
    },
    FallbackPost {
        id: 3,
        slug: "seo-benefits",
        title: "SEO Benefits of Fast-Loading Websites Built with Astro",
        content: "<p>Core Web Vitals are a ranking factor, and Astro sites excel at them.</p>\
                  <h2>Core Web Vitals Explained</h2>\
                  <p>They measure loading performance, interactivity, and visual stability.</p>\
                  <h2>How Astro Delivers Superior Results</h2>\
                  <ul><li>Less JavaScript means faster Largest Contentful Paint</li>\
                  <li>No framework runtime means better input responsiveness</li>\
                  <li>Static HTML reduces Cumulative Layout Shift</li></ul>",
        excerpt: "Google's Core Web Vitals are now critical ranking factors. Learn how \
                  Astro-powered websites naturally excel at these performance metrics for better SEO results.",
        date: (2023, 10, 15),
        modified: (2023, 10, 20),
        media: (
            "https://images.unsplash.com/photo-1562577308-c8b2614b9b9a?q=80&w=2074&auto=format&fit=crop",
            "SEO and analytics visualization",
        ),
        categories: &[(6, "SEO", "seo"), (7, "Marketing", "marketing")],
        tags: &[(5, "Core Web Vitals", "core-web-vitals"), (6, "Google", "google")],
        author: (3, "SEO Specialist", "https://i.pravatar.cc/96?img=3"),
    },
];

impl FallbackPost {
    fn to_entity(&self) -> ContentEntity {
        ContentEntity {
            id: self.id,
            slug: Slug::from(self.slug),
            title: self.title.to_string(),
            content: self.content.to_string(),
            excerpt: self.excerpt.to_string(),
            date: ymd(self.date),
            modified: ymd(self.modified),
            featured_media: Some(MediaRef {
                id: self.id,
                url: self.media.0.to_string(),
                alt: self.media.1.to_string(),
            }),
            categories: terms(self.categories),
            tags: terms(self.tags),
            author: Some(AuthorRef {
                id: self.author.0,
                name: self.author.1.to_string(),
                avatar: self.author.2.to_string(),
            }),
        }
    }
}

fn ymd((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn terms(table: &[(u64, &str, &str)]) -> Vec<TermRef> {
    table
        .iter()
        .map(|(id, name, slug)| TermRef {
            id: *id,
            name: name.to_string(),
            slug: slug.to_string(),
        })
        .collect()
}

/// Fixed posts substituted for live content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FallbackDataset {
    posts: Vec<ContentEntity>,
}

impl FallbackDataset {
    pub fn new(posts: Vec<ContentEntity>) -> Self {
        Self { posts }
    }

    /// The three sample posts shipped with the site.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_POSTS.iter().map(FallbackPost::to_entity).collect())
    }

    pub fn all(&self) -> &[ContentEntity] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// One page, sliced the way WordPress paginates: `page` is 1-based.
    pub fn page(&self, page: u32, page_size: u32) -> Vec<ContentEntity> {
        let size = page_size.max(1) as usize;
        let start = (page.max(1) as usize - 1).saturating_mul(size);
        self.posts
            .iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect()
    }

    pub fn total_pages(&self, page_size: u32) -> u32 {
        let size = page_size.max(1) as usize;
        u32::try_from(self.posts.len().div_ceil(size)).unwrap_or(u32::MAX)
    }

    pub fn find(&self, slug: &str) -> Option<&ContentEntity> {
        self.posts.iter().find(|p| p.slug.as_str() == slug)
    }
}
