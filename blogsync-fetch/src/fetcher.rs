//! Entity fetcher: WordPress posts with retry and local fallback.
//!
//! ## Degradation tiers
//!
//! | Failure | Result | Log tier |
//! |---|---|---|
//! | category lookup fails or is empty | configured fallback id, batch flagged as fallback | `category-fallback` |
//! | posts request exhausts retries | fallback dataset | `fetch-unavailable` |
//! | posts response does not decode | fallback dataset | `invalid-response` |
//! | slug missing remotely | fallback dataset lookup | `slug-fallback` |
//!
//! No method on [`Fetcher`] returns an error: every failure degrades.

use std::collections::HashSet;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use blogsync_core::{
    CategoryFilter, CategoryResolution, ContentEntity, ContentSource, FallbackReason, SyncConfig,
    TermRef,
};

use crate::error::FetchError;
use crate::fallback::FallbackDataset;
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{Request, Transport, UreqTransport};
use crate::wire::{Exclude, WpCategory, WpPost};

/// WordPress caps `per_page` at 100.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A batch of posts plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPosts {
    pub entities: Vec<ContentEntity>,
    pub source: ContentSource,
    pub category: CategoryFilter,
    /// Total pages reported for this query (live) or implied by the fallback
    /// dataset.
    pub total_pages: Option<u32>,
}

impl FetchedPosts {
    /// True when the posts are not the live contents of the wanted category:
    /// either the fallback dataset was served, or the category lookup failed
    /// and the posts came from the configured fallback category.
    pub fn using_fallback(&self) -> bool {
        self.source.is_fallback() || self.category.resolution == CategoryResolution::Fallback
    }
}

/// Outcome of a single-post lookup. `NotFound` is absence, not failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SlugLookup {
    Found {
        entity: ContentEntity,
        source: ContentSource,
    },
    NotFound,
}

impl SlugLookup {
    pub fn into_entity(self) -> Option<ContentEntity> {
        match self {
            SlugLookup::Found { entity, .. } => Some(entity),
            SlugLookup::NotFound => None,
        }
    }
}

/// Fetches posts through a [`Transport`], falling back to a local dataset.
pub struct Fetcher {
    config: SyncConfig,
    transport: Box<dyn Transport>,
    fallback: FallbackDataset,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(config: SyncConfig, transport: Box<dyn Transport>, fallback: FallbackDataset) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            transport,
            fallback,
            retry,
        }
    }

    /// Production fetcher: `ureq` transport configured from `config`.
    pub fn with_ureq(config: SyncConfig, fallback: FallbackDataset) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::new(config, Box::new(transport), fallback)
    }

    /// Replace the retry policy derived from the config.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn fallback(&self) -> &FallbackDataset {
        &self.fallback
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    /// All categories (first 100), names decoded.
    pub fn fetch_categories(&self) -> Result<Vec<TermRef>, FetchError> {
        let request = Request::new(self.endpoint("categories")).query("per_page", MAX_PAGE_SIZE);
        let (categories, _) = self.get_json::<Vec<WpCategory>>("categories", request)?;
        Ok(categories.into_iter().map(WpCategory::into_term).collect())
    }

    /// Category used to filter posts. Never fails: lookup problems yield the
    /// configured fallback id.
    pub fn resolve_category(&self) -> CategoryFilter {
        let categories = match self.fetch_categories() {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => {
                warn!(
                    tier = %CategoryResolution::Fallback,
                    fallback_id = self.config.fallback_category_id,
                    "WordPress returned no categories; using fallback category id"
                );
                return self.fallback_category();
            }
            Err(err) => {
                warn!(
                    tier = %CategoryResolution::Fallback,
                    fallback_id = self.config.fallback_category_id,
                    error = %err,
                    "category lookup failed; using fallback category id"
                );
                return self.fallback_category();
            }
        };

        match select_category(&categories, &self.config) {
            Some((term, resolution)) => {
                info!(
                    id = term.id,
                    name = %term.name,
                    resolution = %resolution,
                    "resolved post category"
                );
                CategoryFilter {
                    id: term.id,
                    slug: term.slug.clone(),
                    resolution,
                }
            }
            None => {
                let available: Vec<String> = categories
                    .iter()
                    .map(|c| format!("{} ({})", c.slug, c.name))
                    .collect();
                warn!(
                    tier = %CategoryResolution::Fallback,
                    wanted = %self.config.category_slug,
                    available = %available.join(", "),
                    "category not found; using fallback category id"
                );
                self.fallback_category()
            }
        }
    }

    fn fallback_category(&self) -> CategoryFilter {
        CategoryFilter {
            id: self.config.fallback_category_id,
            slug: self.config.category_slug.clone(),
            resolution: CategoryResolution::Fallback,
        }
    }

    fn configured_category(&self, id: u64) -> CategoryFilter {
        CategoryFilter {
            id,
            slug: self.config.category_slug.clone(),
            resolution: CategoryResolution::Configured,
        }
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// One page of posts; see [`Fetcher::fetch_page`].
    pub fn fetch_entities(
        &self,
        page: u32,
        page_size: u32,
        category_filter: Option<u64>,
    ) -> Vec<ContentEntity> {
        self.fetch_page(page, page_size, category_filter).entities
    }

    /// One page of posts. When `category_filter` is `None` the category is
    /// resolved first. Failures serve the same page of the fallback dataset.
    pub fn fetch_page(&self, page: u32, page_size: u32, category_filter: Option<u64>) -> FetchedPosts {
        let category = match category_filter {
            Some(id) => self.configured_category(id),
            None => self.resolve_category(),
        };
        let page = page.max(1);
        let page_size = clamp_page_size(page_size);

        match self.request_posts(page, page_size, &category) {
            Ok((entities, total_pages)) => {
                info!(page, count = entities.len(), "fetched posts from WordPress");
                FetchedPosts {
                    entities,
                    source: ContentSource::Remote,
                    category,
                    total_pages,
                }
            }
            Err(err) => {
                let reason = err.fallback_reason();
                warn!(
                    tier = reason.tier(),
                    page,
                    error = %err,
                    "WordPress unavailable; serving fallback posts"
                );
                FetchedPosts {
                    entities: self.fallback.page(page, page_size),
                    source: ContentSource::Fallback(reason),
                    category,
                    total_pages: Some(self.fallback.total_pages(page_size)),
                }
            }
        }
    }

    /// Every page of posts in the resolved category.
    ///
    /// All-or-nothing: if any page fails, the complete fallback dataset is
    /// returned instead of a partial remote listing.
    pub fn fetch_all(&self, page_size: u32) -> FetchedPosts {
        let category = self.resolve_category();
        let page_size = clamp_page_size(page_size);
        let max_pages = self.config.max_pages.max(1);

        let mut all = Vec::new();
        let mut page = 1;
        let mut paged_by_header = false;
        loop {
            match self.request_posts(page, page_size, &category) {
                Ok((mut entities, total_pages)) => {
                    paged_by_header = total_pages.is_some();
                    let fetched = u32::try_from(entities.len()).unwrap_or(u32::MAX);
                    all.append(&mut entities);
                    let last = match total_pages {
                        Some(total) => page >= total,
                        None => fetched < page_size,
                    };
                    if last || fetched == 0 {
                        break;
                    }
                    if page >= max_pages {
                        warn!(max_pages, "page limit reached; remaining posts not fetched");
                        break;
                    }
                    page += 1;
                }
                // Without a page count a full last page looks like more to
                // come; WordPress rejects the page after it with a 400.
                Err(err) if page > 1 && !paged_by_header && err.status() == Some(400) => {
                    debug!(page, "page past the end of the listing; pagination complete");
                    page -= 1;
                    break;
                }
                Err(err) => {
                    let reason = err.fallback_reason();
                    warn!(
                        tier = reason.tier(),
                        page,
                        error = %err,
                        "WordPress unavailable; serving complete fallback dataset"
                    );
                    return FetchedPosts {
                        entities: self.fallback.all().to_vec(),
                        source: ContentSource::Fallback(reason),
                        category,
                        total_pages: Some(self.fallback.total_pages(page_size)),
                    };
                }
            }
        }

        let entities = dedup_by_slug(all);
        info!(count = entities.len(), pages = page, "fetched all posts from WordPress");
        FetchedPosts {
            entities,
            source: ContentSource::Remote,
            category,
            total_pages: Some(page),
        }
    }

    fn request_posts(
        &self,
        page: u32,
        page_size: u32,
        category: &CategoryFilter,
    ) -> Result<(Vec<ContentEntity>, Option<u32>), FetchError> {
        let request = self.cache_bust(
            Request::new(self.endpoint("posts"))
                .query("_embed", "true")
                .query("page", page)
                .query("per_page", page_size)
                .query("categories", category.id),
        );
        let (posts, total_pages) = self.get_json::<Vec<WpPost>>("posts", request)?;
        let exclude = Exclude {
            slug: &category.slug,
            id: Some(category.id),
        };
        let entities = posts
            .into_iter()
            .filter(|p| {
                let keep = !p.slug.trim().is_empty();
                if !keep {
                    warn!(id = p.id, "skipping post without slug");
                }
                keep
            })
            .map(|p| p.into_entity(exclude))
            .collect();
        Ok((dedup_by_slug(entities), total_pages))
    }

    // -----------------------------------------------------------------------
    // Single post
    // -----------------------------------------------------------------------

    /// The post with `slug`, or `None` when neither WordPress nor the fallback
    /// dataset has it.
    pub fn fetch_by_slug(&self, slug: &str) -> Option<ContentEntity> {
        self.lookup_by_slug(slug).into_entity()
    }

    pub fn lookup_by_slug(&self, slug: &str) -> SlugLookup {
        let request = self.cache_bust(
            Request::new(self.endpoint("posts"))
                .query("_embed", "true")
                .query("slug", slug),
        );
        match self.get_json::<Vec<WpPost>>("post-by-slug", request) {
            Ok((posts, _)) => {
                let exclude = Exclude {
                    slug: &self.config.category_slug,
                    id: None,
                };
                match posts.into_iter().find(|p| p.slug == slug) {
                    Some(post) => SlugLookup::Found {
                        entity: post.into_entity(exclude),
                        source: ContentSource::Remote,
                    },
                    None => self.slug_fallback(slug, FallbackReason::NotFoundRemotely),
                }
            }
            Err(err) => {
                warn!(
                    slug,
                    tier = err.fallback_reason().tier(),
                    error = %err,
                    "post lookup failed; searching fallback posts"
                );
                self.slug_fallback(slug, err.fallback_reason())
            }
        }
    }

    fn slug_fallback(&self, slug: &str, reason: FallbackReason) -> SlugLookup {
        match self.fallback.find(slug) {
            Some(entity) => {
                warn!(slug, tier = reason.tier(), "serving fallback copy of post");
                SlugLookup::Found {
                    entity: entity.clone(),
                    source: ContentSource::Fallback(reason),
                }
            }
            None => {
                info!(slug, "post not found");
                SlugLookup::NotFound
            }
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base_url.trim_end_matches('/'))
    }

    fn cache_bust(&self, request: Request) -> Request {
        if self.config.cache_bust {
            request.query("_", Utc::now().timestamp_millis())
        } else {
            request
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: Request,
    ) -> Result<(T, Option<u32>), FetchError> {
        debug!(operation, url = %request.url, "GET");
        let response = with_retry(&self.retry, operation, || self.transport.get(&request))?;
        let value = serde_json::from_str(&response.body).map_err(|source| FetchError::Decode {
            url: request.url.clone(),
            source,
        })?;
        Ok((value, response.total_pages))
    }
}

/// Pick the filter category: exact slug, then alias slug, then name hint.
/// Each tier scans the whole list before the next tier is tried.
pub fn select_category<'a>(
    categories: &'a [TermRef],
    config: &SyncConfig,
) -> Option<(&'a TermRef, CategoryResolution)> {
    if let Some(term) = categories.iter().find(|c| c.slug == config.category_slug) {
        return Some((term, CategoryResolution::Exact));
    }
    if let Some(term) = categories
        .iter()
        .find(|c| config.category_aliases.iter().any(|alias| *alias == c.slug))
    {
        return Some((term, CategoryResolution::Alias));
    }
    let hint = config.category_name_hint.trim().to_lowercase();
    if hint.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| c.name.to_lowercase().contains(&hint))
        .map(|term| (term, CategoryResolution::NameMatch))
}

fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

fn dedup_by_slug(entities: Vec<ContentEntity>) -> Vec<ContentEntity> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .filter(|e| {
            let first = seen.insert(e.slug.clone());
            if !first {
                debug!(slug = %e.slug, "dropping duplicate post");
            }
            first
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn term(id: u64, name: &str, slug: &str) -> TermRef {
        TermRef {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[rstest]
    #[case::exact_beats_alias(
        vec![term(1, "Old", "astrobotdesign"), term(2, "New", "astrobot-design")],
        Some((2, CategoryResolution::Exact))
    )]
    #[case::alias_beats_name(
        vec![term(3, "Astrobot news", "news"), term(4, "Legacy", "astrobotdesign")],
        Some((4, CategoryResolution::Alias))
    )]
    #[case::name_hint_case_insensitive(
        vec![term(5, "General", "general"), term(6, "The ASTROBOT Blog", "blog")],
        Some((6, CategoryResolution::NameMatch))
    )]
    #[case::nothing_matches(vec![term(7, "General", "general")], None)]
    #[case::empty(vec![], None)]
    fn category_priority(
        #[case] categories: Vec<TermRef>,
        #[case] expected: Option<(u64, CategoryResolution)>,
    ) {
        let config = SyncConfig::default();
        let got = select_category(&categories, &config).map(|(t, r)| (t.id, r));
        assert_eq!(got, expected);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(10), 10);
        assert_eq!(clamp_page_size(500), MAX_PAGE_SIZE);
    }
}
