//! Deepcrawl: a single-domain deep web crawler
//!
//! This crate walks a website breadth-first from a start URL, keeps the crawl
//! inside the start URL's domain, extracts structured data from every page with
//! user-defined selectors, and hands the results to exporters and a
//! persistent cache.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod page;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Deepcrawl operations
#[derive(Debug, Error)]
pub enum DeepcrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Cache error: {0}")]
    Cache(#[from] storage::CacheError),

    #[error("Cache is disabled")]
    CacheDisabled,

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("DNS resolver error: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are fatal: they surface while the crawler is being built and the run
/// never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid start URL: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Deepcrawl operations
pub type Result<T> = std::result::Result<T, DeepcrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{load_project, ProjectConfig, Settings};
pub use crawler::{Crawler, CrawlerBuilder, FetchError, RunOptions};
pub use extract::{Dom, Selector, Selectors};
pub use page::{Data, Page};
pub use crate::url::normalize_url;
