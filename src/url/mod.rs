//! URL handling module for Deepcrawl
//!
//! This module provides URL normalization, the crawl scope check and the
//! ignored-extension filter used by link discovery.

mod filter;
mod normalize;

use url::Url;

// Re-export main functions
pub use filter::{has_ignored_extension, IGNORED_EXTENSIONS};
pub use normalize::{normalize_parsed, normalize_url};

/// The set of URLs a crawl is allowed to visit
///
/// A crawl never leaves the network location of its start URL: a link is in
/// scope when its host (case-insensitive) and its explicit port equal the
/// start URL's. The scheme and the path are not compared, so a crawl started
/// on a sub-page still walks the whole site unless a custom link filter
/// narrows it down.
///
/// When the start URL redirects to another host (`example.com` to
/// `www.example.com`), that host is added with [`allow`](Self::allow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    host: String,
    port: Option<u16>,
    aliases: Vec<(String, Option<u16>)>,
}

impl CrawlScope {
    /// Builds the scope of a crawl from its start URL
    ///
    /// Returns `None` if the URL has no host.
    pub fn from_start_url(start: &Url) -> Option<Self> {
        let host = start.host_str()?.to_lowercase();
        Some(Self {
            host,
            port: start.port(),
            aliases: Vec::new(),
        })
    }

    /// The domain of the crawl as `host` or `host:port`
    ///
    /// Used to name cache databases and export files.
    pub fn domain(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Returns true if the URL belongs to this crawl
    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let port = url.port();

        std::iter::once((self.host.as_str(), self.port))
            .chain(self.aliases.iter().map(|(h, p)| (h.as_str(), *p)))
            .any(|(h, p)| host.eq_ignore_ascii_case(h) && port == p)
    }

    /// Adds the host and port of `url` to the scope
    ///
    /// Returns false if the URL was already in scope or has no host. The
    /// domain used for cache and export names does not change.
    pub fn allow(&mut self, url: &Url) -> bool {
        if self.contains(url) {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };

        self.aliases.push((host.to_lowercase(), url.port()));
        true
    }
}

/// Returns true if the start URL points below the site root
///
/// Crawling from such a page with the default link filter still visits the
/// whole domain.
pub fn is_sub_page(start: &Url) -> bool {
    !start.path().trim_matches('/').is_empty()
}
