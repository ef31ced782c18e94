use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::crawler::LinkFilter;
use crate::output::ExporterSpec;

/// Per-run crawler settings
///
/// Every field has a default, so a project file only lists what it changes.
/// Programmatic use goes through struct update syntax:
///
/// ```
/// use deepcrawl::Settings;
///
/// let settings = Settings {
///     max_depth: 2,
///     delta_crawl: true,
///     ..Settings::default()
/// };
/// assert!(settings.caching_enabled());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Deepest level fetched; the start URL is depth 0
    pub max_depth: u32,

    /// Maximum number of requests in flight at once
    pub max_concurrency: usize,

    /// Pause between depth levels (seconds)
    pub download_delay: f64,

    /// Per-request timeout (seconds)
    pub request_timeout: f64,

    /// Value of the `Accept-Language` header
    pub language: String,

    /// Rule selecting the links to follow
    pub link_filter: LinkFilter,

    /// Store results in the cache after each run
    pub caching: bool,

    /// Skip URLs already in the cache; implies `caching`
    pub delta_crawl: bool,

    /// Directory the built-in exporters write to
    pub export_to: PathBuf,

    /// Exporters run after each crawl, in order
    pub exporters: Vec<ExporterSpec>,

    /// Name server IPs; empty uses the system resolver
    pub dns_providers: Vec<String>,

    /// Directory holding the per-domain cache databases
    pub cache_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_concurrency: 20,
            download_delay: 0.0,
            request_timeout: 15.0,
            language: "en-us".to_string(),
            link_filter: LinkFilter::default(),
            caching: false,
            delta_crawl: false,
            export_to: PathBuf::from("./export"),
            exporters: Vec::new(),
            dns_providers: Vec::new(),
            cache_dir: PathBuf::from("./.deepcrawl/cache"),
        }
    }
}

impl Settings {
    /// Returns true if runs read from or write to the cache
    pub fn caching_enabled(&self) -> bool {
        self.caching || self.delta_crawl
    }
}

/// A crawl project as written in a TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Where the crawl starts; also fixes the crawl's domain
    pub start_url: String,

    #[serde(default)]
    pub settings: Settings,

    /// Field name to XPath query, or `builtin:<name>` for a built-in selector
    #[serde(default)]
    pub selectors: BTreeMap<String, String>,
}
