//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client (timeout, redirects, optional DNS providers)
//! - Admission control through a global semaphore
//! - Browser-like request headers with a random user agent
//! - Error classification

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::config::Settings;
use crate::DeepcrawlError;

/// Chrome user agents on Windows and Linux, one is picked per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.5993.118 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.5414.120 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.5938.132 Safari/537.36",
];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Why a URL could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Timeout Error")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// A response, whatever its status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
}

/// Fetches pages under a global concurrency limit
pub struct Fetcher {
    client: Client,
    gate: Arc<Semaphore>,
    language: String,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Fetcher {
    /// Builds a fetcher from the crawl settings
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated crawl settings
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Client and resolver are ready
    /// * `Err(DeepcrawlError)` - The HTTP client or DNS resolver could not be built
    pub fn new(settings: &Settings) -> Result<Self, DeepcrawlError> {
        let client = build_http_client(settings)?;

        Ok(Self {
            client,
            gate: Arc::new(Semaphore::new(settings.max_concurrency)),
            language: settings.language.clone(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    /// Fetches one URL
    ///
    /// Waits for a free slot of the admission gate first. Non-2xx responses
    /// are returned like any other response; only transport failures are
    /// errors. Never retries.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let _guard = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT_LANGUAGE, self.language.as_str())
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await?;

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            status_code,
            body,
        })
    }

    /// Number of requests currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous requests since the last reset
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn reset_peak(&self) {
        self.peak_in_flight.store(0, Ordering::SeqCst);
    }
}

/// Counts one request as in flight until dropped
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builds an HTTP client with proper configuration
///
/// The request timeout covers the whole exchange, body included. When
/// `dns_providers` is set, host names are resolved through those servers
/// instead of the system resolver.
pub fn build_http_client(settings: &Settings) -> Result<Client, DeepcrawlError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs_f64(settings.request_timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if !settings.dns_providers.is_empty() {
        let resolver = ProviderResolver::new(&settings.dns_providers)?;
        builder = builder.dns_resolver(Arc::new(resolver));
    }

    Ok(builder.build()?)
}

/// Resolves host names through a fixed set of name servers
struct ProviderResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl ProviderResolver {
    fn new(providers: &[String]) -> Result<Self, DeepcrawlError> {
        let ips = providers
            .iter()
            .map(|p| {
                p.parse::<IpAddr>().map_err(|e| {
                    crate::ConfigError::Validation(format!("Invalid DNS provider '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let resolver = TokioAsyncResolver::tokio(config, ResolverOpts::default())?;

        Ok(Self {
            resolver: Arc::new(resolver),
        })
    }
}

impl Resolve for ProviderResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.resolver);
        Box::pin(async move {
            let lookup = resolver.lookup_ip(name.as_str()).await?;
            let addrs: Addrs = Box::new(lookup.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}
