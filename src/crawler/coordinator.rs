//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the pieces of a run together:
//! - Validating settings and opening the cache when the crawler is built
//! - Driving the breadth-first traversal
//! - Running selectors and the transform over every page
//! - Handing results to exporters and the cache

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use url::Url;

use crate::config::{validate, validate_settings, ProjectConfig, Settings};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::links::LinkExtractor;
use crate::crawler::scheduler::{Scheduler, SharedCache, Traversal};
use crate::extract::{builtin, scrape, transform, Selector, Selectors, TransformFn};
use crate::output::{print_errors, print_statistics, CrawlStats, OutputError};
use crate::page::{Data, Page};
use crate::storage::{open_cache, CacheError, CacheResult, CacheStore};
use crate::url::{is_sub_page, normalize_url, CrawlScope};
use crate::{ConfigError, DeepcrawlError, Result};

/// Per-run options
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log every page at info level and print statistics at the end
    pub verbose: bool,

    /// Sort results by URL
    pub sort_results: bool,

    /// Keep the raw body of pages that went through extraction
    pub keep_raw_content: bool,

    /// Store results in the cache even if caching is off in the settings
    pub force_caching: bool,
}

/// Builder for a [`Crawler`]
pub struct CrawlerBuilder {
    start_url: String,
    settings: Settings,
    selectors: Selectors,
    transform: Option<TransformFn>,
    cache: Option<Box<dyn CacheStore + Send>>,
}

impl CrawlerBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds a named field to extract from every page
    pub fn select(mut self, field: impl Into<String>, selector: impl Into<Selector>) -> Self {
        self.selectors.insert(field.into(), selector.into());
        self
    }

    pub fn selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Sets the function run over the extracted data of every page
    pub fn transform<F>(mut self, func: F) -> Self
    where
        F: Fn(Data) -> anyhow::Result<Data> + Send + Sync + 'static,
    {
        self.transform = Some(std::sync::Arc::new(func));
        self
    }

    /// Uses this store instead of the SQLite database under `cache_dir`
    pub fn cache(mut self, store: Box<dyn CacheStore + Send>) -> Self {
        self.cache = Some(store);
        self
    }

    /// Validates the configuration and builds the crawler
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(DeepcrawlError)` - Invalid start URL or settings, a transform
    ///   without selectors, or a cache or HTTP client that could not be set up
    pub fn build(self) -> Result<Crawler> {
        validate_settings(&self.settings)?;

        let start_url = normalize_url(&self.start_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", self.start_url, e)))?;
        let parsed = Url::parse(&start_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", start_url, e)))?;
        let scope = CrawlScope::from_start_url(&parsed)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("'{}' has no host", start_url)))?;

        if self.transform.is_some() && self.selectors.is_empty() {
            return Err(ConfigError::Validation(
                "A transform needs at least one selector to produce data".to_string(),
            )
            .into());
        }

        if is_sub_page(&parsed) && self.settings.link_filter.is_default() {
            tracing::warn!(
                "{} is not the site root; the default link filter will still crawl all of {}",
                start_url,
                scope.domain()
            );
        }

        let domain = scope.domain();

        let cache = match self.cache {
            Some(store) => Some(store),
            None if self.settings.caching_enabled() => {
                let store = open_cache(&self.settings.cache_dir, &domain)?;
                tracing::debug!("Opened cache for {} in {}", domain, self.settings.cache_dir.display());
                Some(Box::new(store) as Box<dyn CacheStore + Send>)
            }
            None => None,
        };

        let fetcher = Fetcher::new(&self.settings)?;
        let links = LinkExtractor::new(self.settings.link_filter.clone(), scope);

        Ok(Crawler {
            start_url,
            domain,
            settings: self.settings,
            selectors: self.selectors,
            transform: self.transform,
            fetcher,
            links,
            cache: cache.map(Mutex::new),
            results: Vec::new(),
            errors: BTreeMap::new(),
            stats: CrawlStats::default(),
        })
    }
}

/// A crawler bound to one start URL and its domain
///
/// ```no_run
/// use deepcrawl::{Crawler, RunOptions, Settings};
///
/// # async fn crawl() -> deepcrawl::Result<()> {
/// let mut crawler = Crawler::builder("https://quotes.toscrape.com/")
///     .settings(Settings { max_depth: 2, ..Settings::default() })
///     .select("title", "string(//title[1])")
///     .build()?;
///
/// crawler.run(RunOptions::default()).await?;
/// for page in crawler.results() {
///     println!("{} {:?}", page.url, page.field("title"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    start_url: String,
    domain: String,
    settings: Settings,
    selectors: Selectors,
    transform: Option<TransformFn>,
    fetcher: Fetcher,
    links: LinkExtractor,
    cache: Option<SharedCache>,
    results: Vec<Page>,
    errors: BTreeMap<String, FetchError>,
    stats: CrawlStats,
}

impl Crawler {
    pub fn builder(start_url: impl Into<String>) -> CrawlerBuilder {
        CrawlerBuilder {
            start_url: start_url.into(),
            settings: Settings::default(),
            selectors: Selectors::new(),
            transform: None,
            cache: None,
        }
    }

    /// Builds a crawler from a project file's contents
    ///
    /// Selectors written as `builtin:<name>` resolve to the callbacks in
    /// [`builtin`]; everything else is an XPath query.
    pub fn from_project(project: &ProjectConfig) -> Result<Self> {
        validate(project)?;

        let mut builder = Self::builder(project.start_url.as_str()).settings(project.settings.clone());

        for (field, query) in &project.selectors {
            let selector = match query.strip_prefix(builtin::PREFIX) {
                Some(name) => builtin::by_name(name).ok_or_else(|| {
                    ConfigError::Validation(format!("Unknown built-in selector '{}'", name))
                })?,
                None => Selector::query(query.as_str()),
            };
            builder = builder.select(field.as_str(), selector);
        }

        builder.build()
    }

    /// Crawls the site, then extracts, exports and caches the results
    ///
    /// Results and errors of an earlier run are replaced. Fetch failures
    /// never fail the run; they end up in [`errors`](Self::errors). An
    /// exporter that fails is logged and skipped. A failure to write the
    /// cache is returned, with the results still available.
    pub async fn run(&mut self, options: RunOptions) -> Result<()> {
        let started = Instant::now();

        self.results.clear();
        self.errors.clear();
        self.fetcher.reset_peak();

        tracing::info!(
            "Crawling {} (max depth {}, concurrency {})",
            self.start_url,
            self.settings.max_depth,
            self.settings.max_concurrency
        );

        let Traversal {
            frontier,
            skipped_cached,
            max_depth_reached,
        } = Scheduler::new(
            &self.fetcher,
            &self.links,
            &self.settings,
            self.cache.as_ref(),
            &self.start_url,
        )
        .verbose(options.verbose)
        .run()
        .await;

        let (pages, errors) = frontier.into_parts();

        let mut pages = process(
            pages,
            &self.selectors,
            self.transform.as_ref(),
            options.keep_raw_content,
        );
        if options.sort_results {
            pages.sort_by(|a, b| a.url.cmp(&b.url));
        }

        self.results = pages;
        self.errors = errors;
        self.stats = CrawlStats::new(
            self.results.len(),
            self.errors.len(),
            skipped_cached,
            max_depth_reached,
            self.fetcher.peak_in_flight(),
            started.elapsed(),
        );

        self.export();
        let stored = self.store_results(options.force_caching);

        if options.verbose {
            print_statistics(&self.stats);
            print_errors(&self.errors);
        } else {
            tracing::info!(
                "Processed {} pages in {:.2} seconds [{}]",
                self.stats.pages,
                self.stats.duration.as_secs_f64(),
                self.domain
            );
        }

        stored
    }

    fn export(&self) {
        for spec in &self.settings.exporters {
            let exporter = spec.build(&self.domain, &self.results, &self.settings);
            if let Err(e) = exporter.export() {
                tracing::error!("Exporter '{}' failed: {}", spec.name(), e);
            }
        }
    }

    /// Writes the results to the cache
    ///
    /// A forced write without an open cache goes to a store opened for this
    /// call only; the crawler's own cache state is left as it was.
    fn store_results(&self, force: bool) -> Result<()> {
        match &self.cache {
            Some(cache) if self.settings.caching_enabled() || force => {
                let mut store = lock(cache)?;
                write_pages(&mut **store, &self.results)?;
            }
            Some(_) => {}
            None if force => {
                let mut store = open_cache(&self.settings.cache_dir, &self.domain)?;
                write_pages(&mut store, &self.results)?;
            }
            None => {}
        }

        Ok(())
    }

    /// Pages of the last run
    pub fn results(&self) -> &[Page] {
        &self.results
    }

    /// URLs of the last run that could not be fetched
    pub fn errors(&self) -> &BTreeMap<String, FetchError> {
        &self.errors
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Every page in the cache
    pub fn cache(&self) -> Result<Vec<Page>> {
        let cache = self.cache.as_ref().ok_or(DeepcrawlError::CacheDisabled)?;
        let pages = lock(cache)?.get_all()?;
        Ok(pages)
    }

    /// Empties the cache, returning how many pages were removed
    pub fn clear_cache(&self) -> Result<usize> {
        let cache = self.cache.as_ref().ok_or(DeepcrawlError::CacheDisabled)?;
        let mut store = lock(cache)?;
        let removed = store.clear()?;
        tracing::info!("Removed {} cached pages [{}]", removed, self.domain);
        Ok(removed)
    }

    /// Writes every cached page to a JSON file
    ///
    /// Defaults to `./dump-<domain>.json`. Returns the path written.
    pub fn dump_cache(&self, path: Option<&Path>) -> Result<PathBuf> {
        let pages = self.cache()?;

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(format!("./dump-{}.json", self.domain.replace(':', "_"))),
        };

        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &pages).map_err(OutputError::from)?;

        tracing::info!("Dumped {} cached pages to {}", pages.len(), path.display());
        Ok(path)
    }

    /// Normalized start URL
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Domain of the crawl as `host` or `host:port`
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Runs selectors and the transform over every page
fn process(
    pages: Vec<Page>,
    selectors: &Selectors,
    func: Option<&TransformFn>,
    keep_raw: bool,
) -> Vec<Page> {
    pages
        .into_iter()
        .map(|page| {
            let page = scrape(page, selectors, keep_raw);
            match func {
                Some(func) => transform(page, func),
                None => page,
            }
        })
        .collect()
}

fn write_pages<S: CacheStore + ?Sized>(store: &mut S, pages: &[Page]) -> CacheResult<()> {
    for page in pages {
        store.put(&page.url, page)?;
    }
    tracing::debug!("Cached {} pages", pages.len());
    Ok(())
}

fn lock(cache: &SharedCache) -> CacheResult<MutexGuard<'_, Box<dyn CacheStore + Send>>> {
    cache.lock().map_err(|_| CacheError::Poisoned)
}
