//! Statistics of a finished crawl
//!
//! This module records what a run did and renders it for the terminal.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::crawler::FetchError;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// Pages fetched
    pub pages: usize,

    /// URLs that failed to fetch
    pub errors: usize,

    /// Links skipped because they were already cached
    pub skipped_cached: usize,

    /// Deepest level that produced a page
    pub max_depth_reached: u32,

    /// Highest number of simultaneous requests
    pub peak_in_flight: usize,

    /// Wall-clock time of the run
    pub duration: Duration,

    pub pages_per_second: f64,
}

impl CrawlStats {
    pub fn new(
        pages: usize,
        errors: usize,
        skipped_cached: usize,
        max_depth_reached: u32,
        peak_in_flight: usize,
        duration: Duration,
    ) -> Self {
        let secs = duration.as_secs_f64();
        let pages_per_second = if secs > 0.0 { pages as f64 / secs } else { 0.0 };

        Self {
            pages,
            errors,
            skipped_cached,
            max_depth_reached,
            peak_in_flight,
            duration,
            pages_per_second,
        }
    }

    /// Share of attempted URLs that produced a page, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages + self.errors;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("  Pages:        {}", stats.pages);
    println!("  Errors:       {}", stats.errors);
    println!("  Cached skips: {}", stats.skipped_cached);
    println!("  Max depth:    {}", stats.max_depth_reached);
    println!("  Peak fetches: {}", stats.peak_in_flight);
    println!("  Duration:     {:.2}s", stats.duration.as_secs_f64());
    println!("  Performance:  {:.2} p/s", stats.pages_per_second);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} URLs fetched)",
        stats.success_rate(),
        stats.pages,
        stats.pages + stats.errors
    );
}

/// Prints the failed URLs as a two-column table
pub fn print_errors(errors: &BTreeMap<String, FetchError>) {
    if errors.is_empty() {
        return;
    }

    let width = errors.keys().map(String::len).max().unwrap_or(3).max(3);

    println!("\n=== Errors ({}) ===\n", errors.len());
    println!("  {:<width$}  Error", "URL", width = width);
    for (url, error) in errors {
        println!("  {:<width$}  {}", url, error, width = width);
    }
}
