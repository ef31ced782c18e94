//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a global concurrency limit
//! - Link discovery and filtering
//! - Breadth-first scheduling with per-run deduplication
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod links;
mod scheduler;

pub use coordinator::{Crawler, CrawlerBuilder, RunOptions};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use frontier::Frontier;
pub use links::{LinkExtractor, LinkFilter, LinkFilterFn, DEFAULT_LINK_QUERY};
pub use scheduler::{CrawlPhase, Scheduler, SharedCache, Traversal};
