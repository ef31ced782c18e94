//! Breadth-first traversal of a site
//!
//! The crawl proceeds one depth level at a time:
//! - Every URL of the current level is fetched concurrently, bounded by the
//!   fetcher's admission gate
//! - Once all of them have finished, results are merged and the links they
//!   contain become the next level
//! - The walk stops when a level comes back empty or `max_depth` is reached

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::Settings;
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::LinkExtractor;
use crate::page::Page;
use crate::storage::CacheStore;

/// Cache handle shared with the scheduler
pub type SharedCache = Mutex<Box<dyn CacheStore + Send>>;

/// Where a traversal currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    Seeding,
    Fetching { depth: u32 },
    Merging { depth: u32 },
    Draining,
    Done,
}

/// What a finished traversal produced
#[derive(Debug)]
pub struct Traversal {
    pub frontier: Frontier,
    /// Distinct links left out because they were already cached
    pub skipped_cached: usize,
    /// Deepest level that produced at least one page
    pub max_depth_reached: u32,
}

/// Drives one breadth-first traversal
pub struct Scheduler<'a> {
    fetcher: &'a Fetcher,
    links: LinkExtractor,
    settings: &'a Settings,
    cache: Option<&'a SharedCache>,
    start_url: &'a str,
    verbose: bool,
    phase: CrawlPhase,
    frontier: Frontier,
    skipped: HashSet<String>,
    max_depth_reached: u32,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared fetcher holding the admission gate
    /// * `links` - Link extractor scoped to the crawl's domain
    /// * `settings` - Crawl settings
    /// * `cache` - Cache consulted for delta crawls
    /// * `start_url` - Normalized start URL
    pub fn new(
        fetcher: &'a Fetcher,
        links: &'a LinkExtractor,
        settings: &'a Settings,
        cache: Option<&'a SharedCache>,
        start_url: &'a str,
    ) -> Self {
        Self {
            fetcher,
            links: links.clone(),
            settings,
            cache,
            start_url,
            verbose: false,
            phase: CrawlPhase::Idle,
            frontier: Frontier::new(),
            skipped: HashSet::new(),
            max_depth_reached: 0,
        }
    }

    /// Logs every processed page at info level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Walks the site and returns everything that was found
    pub async fn run(mut self) -> Traversal {
        self.transition(CrawlPhase::Seeding);

        let mut batch = Vec::new();
        if self.frontier.reserve(self.start_url, 0) {
            batch.push(self.start_url.to_string());
        }

        let mut depth = 0;
        loop {
            self.transition(CrawlPhase::Fetching { depth });
            debug!("Fetching {} URL(s) at depth {}", batch.len(), depth);

            let outcomes = join_all(batch.iter().map(|url| self.fetcher.fetch(url))).await;

            self.transition(CrawlPhase::Merging { depth });
            let next = self.merge(depth, batch, outcomes);

            if next.is_empty() || depth >= self.settings.max_depth {
                self.transition(CrawlPhase::Draining);
                break;
            }

            if self.settings.download_delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.settings.download_delay)).await;
            }

            depth += 1;
            batch = next;
        }

        self.transition(CrawlPhase::Done);

        Traversal {
            frontier: self.frontier,
            skipped_cached: self.skipped.len(),
            max_depth_reached: self.max_depth_reached,
        }
    }

    fn transition(&mut self, next: CrawlPhase) {
        trace!("Crawl phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Folds the outcomes of one level into the frontier
    ///
    /// Returns the URLs reserved for the next level.
    fn merge(
        &mut self,
        depth: u32,
        batch: Vec<String>,
        outcomes: Vec<Result<FetchedPage, FetchError>>,
    ) -> Vec<String> {
        let follow = depth < self.settings.max_depth;
        let mut next = Vec::new();

        for (url, outcome) in batch.into_iter().zip(outcomes) {
            let fetched = match outcome {
                Ok(fetched) => fetched,
                Err(e) => {
                    match &e {
                        FetchError::Timeout => warn!("Timeout error: {}", url),
                        FetchError::Transport(msg) => warn!("Download error: {} [{}]", msg, url),
                    }
                    self.frontier.fail(&url, e);
                    continue;
                }
            };

            if self.verbose {
                info!("Processed: {} [{}]", url, fetched.status_code);
            } else {
                debug!("Processed: {} [{}]", url, fetched.status_code);
            }

            if url == self.start_url {
                self.follow_start_redirect(&fetched);
            }

            let links = self.discover(&url, &fetched);

            if follow {
                for link in &links {
                    if self.is_pre_cached(link) {
                        continue;
                    }
                    if self.frontier.reserve(link, depth + 1) {
                        next.push(link.clone());
                    }
                }
            }

            self.max_depth_reached = self.max_depth_reached.max(depth);
            self.frontier
                .commit(Page::new(url, fetched.status_code, depth, links, fetched.body));
        }

        next
    }

    /// Adds the host the start URL redirected to, if any, to the crawl scope
    fn follow_start_redirect(&mut self, fetched: &FetchedPage) {
        let Ok(final_url) = Url::parse(&fetched.final_url) else {
            return;
        };

        if self.links.allow(&final_url) {
            info!(
                "Start URL redirected to {}; following links on that host",
                final_url.host_str().unwrap_or_default()
            );
        }
    }

    /// Extracts the links of a fetched page
    ///
    /// Relative links are resolved against the URL the response came from,
    /// which differs from the requested one after a redirect.
    fn discover(&self, url: &str, fetched: &FetchedPage) -> Vec<String> {
        let base = Url::parse(&fetched.final_url).or_else(|_| Url::parse(url));

        match base {
            Ok(base) => self.links.extract_from_html(&base, &fetched.body),
            Err(e) => {
                warn!("Cannot resolve links of {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Returns true if a delta crawl should leave this link out
    fn is_pre_cached(&mut self, link: &str) -> bool {
        if !self.settings.delta_crawl || link == self.start_url {
            return false;
        }
        if self.skipped.contains(link) {
            return true;
        }

        let Some(cache) = self.cache else {
            return false;
        };

        let cached = match cache.lock() {
            Ok(store) => store.contains(link).unwrap_or_else(|e| {
                warn!("Cache lookup failed for {}: {}", link, e);
                false
            }),
            Err(_) => {
                warn!("Cache lock poisoned, treating {} as not cached", link);
                false
            }
        };

        if cached {
            debug!("Dropped pre-cached URL [{}]", link);
            self.skipped.insert(link.to_string());
        }

        cached
    }
}
