//! Link discovery
//!
//! Turns a fetched document into the list of URLs the crawl may follow:
//! - Raw hrefs come from the link filter (an XPath rule or a user callback)
//! - Each href is resolved against the page URL and normalized
//! - Anything out of scope or pointing at an ignored file type is dropped
//! - Duplicates are removed, keeping document order

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::warn;
use url::Url;

use crate::extract::Dom;
use crate::url::{has_ignored_extension, normalize_parsed, CrawlScope};

/// XPath of the default link rule
pub const DEFAULT_LINK_QUERY: &str = "//a/@href";

/// A user function choosing which of a page's links to follow
///
/// It receives the absolute URLs of every `<a href>` on the page.
pub type LinkFilterFn = Arc<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>;

/// Rule selecting the links to follow from a page
#[derive(Clone)]
pub enum LinkFilter {
    /// XPath expression yielding hrefs
    Query(String),
    /// Function filtering the page's anchors
    Callback(LinkFilterFn),
}

impl LinkFilter {
    pub fn callback<F>(func: F) -> Self
    where
        F: Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(func))
    }

    /// Returns true for the stock `//a/@href` rule
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Query(query) if query == DEFAULT_LINK_QUERY)
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::Query(DEFAULT_LINK_QUERY.to_string())
    }
}

impl fmt::Debug for LinkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for LinkFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::Query)
    }
}

/// Extracts the followable links of a page
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    filter: LinkFilter,
    scope: CrawlScope,
}

impl LinkExtractor {
    pub fn new(filter: LinkFilter, scope: CrawlScope) -> Self {
        Self { filter, scope }
    }

    /// Widens the extractor's scope to the host of `url`
    ///
    /// Returns true if the host was not in scope before.
    pub fn allow(&mut self, url: &Url) -> bool {
        self.scope.allow(url)
    }

    /// Parses a document and extracts its links
    pub fn extract_from_html(&self, base_url: &Url, html: &str) -> Vec<String> {
        let dom = Dom::parse(html);
        self.extract(base_url, &dom)
    }

    /// Extracts the links of a parsed document
    ///
    /// The result is absolute, normalized, in scope, free of ignored
    /// extensions and deduplicated, in order of first appearance.
    pub fn extract(&self, base_url: &Url, dom: &Dom) -> Vec<String> {
        let candidates = match &self.filter {
            LinkFilter::Query(query) => match dom.xpath_strings(query) {
                Ok(hrefs) => hrefs,
                Err(e) => {
                    warn!("Link filter failed on {}: {}", base_url, e);
                    return Vec::new();
                }
            },
            LinkFilter::Callback(func) => {
                let anchors = dom
                    .xpath_strings(DEFAULT_LINK_QUERY)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|href| resolve_link(href, base_url))
                    .map(String::from)
                    .collect();

                func(anchors)
            }
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in &candidates {
            let Some(url) = resolve_link(href, base_url) else {
                continue;
            };
            let Ok(url) = normalize_parsed(url) else {
                continue;
            };

            if !self.scope.contains(&url) || has_ignored_extension(&url) {
                continue;
            }

            let link = String::from(url);
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        links
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}
