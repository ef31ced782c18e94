//! The record kept for every successfully fetched page

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extracted data of one page: field name to JSON value
pub type Data = serde_json::Map<String, Value>;

/// A fetched page
///
/// Created by the scheduler when a fetch succeeds, filled in by the
/// extraction pipeline once traversal is complete, then handed to exporters
/// and the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Normalized URL, the identity of the page
    pub url: String,

    /// HTTP status of the response
    pub status_code: u16,

    /// Breadth-first distance from the start URL
    pub depth: u32,

    /// In-scope links found in the body, in document order
    pub links: Vec<String>,

    /// Raw response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Extracted fields, `None` until the pipeline has run
    #[serde(default)]
    pub data: Option<Data>,

    /// Day the page was fetched
    pub discovered_at: NaiveDate,
}

impl Page {
    /// Creates a page for a fresh fetch, discovered today
    pub fn new(
        url: impl Into<String>,
        status_code: u16,
        depth: u32,
        links: Vec<String>,
        content: String,
    ) -> Self {
        Self {
            url: url.into(),
            status_code,
            depth,
            links,
            content: Some(content),
            data: None,
            discovered_at: Local::now().date_naive(),
        }
    }

    /// Returns true if the response had a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Looks up one extracted field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(name))
    }
}
