//! Album page walker over static HTML.
//!
//! Fetches one album page per batch, selects image elements with a CSS
//! selector, and follows the "next page" link until there is none. Scripted
//! browser behaviour (scroll-triggered lazy loading) is not emulated; images
//! that carry their real URL in `data-src` are still picked up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::naming::FilenameScheme;
use super::url_list::validate_url;
use super::{SourceError, TaskSource};
use crate::download::{DownloadTask, HttpClient};

/// Default selector for album images.
pub const DEFAULT_IMAGE_SELECTOR: &str = "div.photo img";

/// Default selector for the link to the following page: the album's right
/// arrow icon (resolved to its enclosing anchor), or a `rel="next"` link.
pub const DEFAULT_NEXT_SELECTOR: &str = r#"i.page-arrow.right, a[rel~="next"]"#;

/// Image attributes checked in order; `data-src` covers lazy-loaded markup.
const IMAGE_ATTRS: [&str; 2] = ["src", "data-src"];

/// Thumbnail suffixes rewritten to the large (`_b`) variant.
const THUMBNAIL_SUFFIXES: [&str; 2] = ["_c.jpg", "_z.jpg"];

/// CSS selectors that describe an album's markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSelectors {
    /// Matches image elements on a page.
    pub image: String,
    /// Matches the next-page link, or an element nested inside it.
    pub next_page: String,
}

impl Default for AlbumSelectors {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE_SELECTOR.to_string(),
            next_page: DEFAULT_NEXT_SELECTOR.to_string(),
        }
    }
}

impl AlbumSelectors {
    fn validate(&self) -> Result<(), SourceError> {
        parse_selector(&self.image)?;
        parse_selector(&self.next_page)?;
        Ok(())
    }
}

/// Walks an album page by page, one batch of tasks per page.
#[derive(Debug)]
pub struct AlbumWalker {
    client: HttpClient,
    output_dir: PathBuf,
    selectors: AlbumSelectors,
    naming: FilenameScheme,
    next_url: Option<Url>,
    visited: HashSet<Url>,
    page: usize,
}

impl AlbumWalker {
    /// Creates a walker starting at `start_url`.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidUrl`] for a non-http(s) start URL,
    /// [`SourceError::InvalidSelector`] if either selector fails to parse.
    pub fn new(
        client: HttpClient,
        start_url: &str,
        output_dir: impl AsRef<Path>,
        selectors: AlbumSelectors,
        naming: FilenameScheme,
    ) -> Result<Self, SourceError> {
        let start = validate_url(start_url.trim())?;
        let start =
            Url::parse(&start).map_err(|e| SourceError::invalid_url(start_url, e.to_string()))?;
        selectors.validate()?;

        Ok(Self {
            client,
            output_dir: output_dir.as_ref().to_path_buf(),
            selectors,
            naming,
            next_url: Some(start),
            visited: HashSet::new(),
            page: 0,
        })
    }

    /// Pages fetched so far.
    #[must_use]
    pub fn pages_visited(&self) -> usize {
        self.page
    }

    /// Images discovered so far across all pages.
    #[must_use]
    pub fn images_found(&self) -> usize {
        self.naming.issued()
    }
}

#[async_trait]
impl TaskSource for AlbumWalker {
    #[instrument(skip(self), fields(page = self.page + 1))]
    async fn next_batch(&mut self) -> Result<Option<Vec<DownloadTask>>, SourceError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };
        self.page += 1;
        let page = self.page;
        info!("Processing page {page}...");

        let html = self
            .client
            .get_text(url.as_str())
            .await
            .map_err(|source| SourceError::Fetch {
                page,
                url: url.to_string(),
                source,
            })?;

        let links = extract_page(&html, &url, &self.selectors)?;
        info!("Found {} images on page {page}", links.images.len());
        self.visited.insert(url);

        match links.next {
            Some(next) if !self.visited.contains(&next) => {
                debug!(next = %next, "following next page link");
                self.next_url = Some(next);
            }
            Some(next) => {
                info!(next = %next, "Next page link points to a visited page. Reached the last page.");
            }
            None => info!("No next page link found. Reached the last page."),
        }

        let tasks = links
            .images
            .into_iter()
            .map(|image| DownloadTask::new(image, &self.output_dir, self.naming.next_name()))
            .collect();
        Ok(Some(tasks))
    }
}

/// What one album page links to.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageLinks {
    images: Vec<String>,
    next: Option<Url>,
}

/// Parses a page and pulls out image URLs and the next-page link.
///
/// The parsed document is dropped before returning so it never lives across
/// an await point.
fn extract_page(
    html: &str,
    page_url: &Url,
    selectors: &AlbumSelectors,
) -> Result<PageLinks, SourceError> {
    let image_selector = parse_selector(&selectors.image)?;
    let next_selector = parse_selector(&selectors.next_page)?;
    let document = Html::parse_document(html);

    let mut images = Vec::new();
    for element in document.select(&image_selector) {
        let Some(raw) = IMAGE_ATTRS
            .iter()
            .filter_map(|attr| element.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty() && !value.starts_with("data:"))
        else {
            debug!(element = element.value().name(), "image element without usable source");
            continue;
        };

        match page_url.join(raw) {
            Ok(resolved) => images.push(upgrade_thumbnail(resolved.as_str())),
            Err(e) => debug!(raw, error = %e, "unresolvable image URL"),
        }
    }

    let next = document
        .select(&next_selector)
        .find_map(link_target)
        .and_then(|href| page_url.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"));

    Ok(PageLinks { images, next })
}

/// Returns the `href` of the element, or of the nearest enclosing anchor.
fn link_target(element: ElementRef<'_>) -> Option<&str> {
    if let Some(href) = element.value().attr("href") {
        return Some(href);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"))
}

/// Rewrites medium/small thumbnail suffixes to the large variant.
fn upgrade_thumbnail(url: &str) -> String {
    THUMBNAIL_SUFFIXES
        .iter()
        .fold(url.to_string(), |acc, suffix| acc.replace(suffix, "_b.jpg"))
}

fn parse_selector(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
