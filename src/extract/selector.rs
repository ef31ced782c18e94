use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::Dom;
use crate::page::{Data, Page};

/// A user function extracting one field from a parsed page
pub type SelectorFn = Arc<dyn Fn(&Dom) -> Value + Send + Sync>;

/// A user function rewriting the extracted data of a page
pub type TransformFn = Arc<dyn Fn(Data) -> anyhow::Result<Data> + Send + Sync>;

/// Field name to selector, evaluated in key order
pub type Selectors = BTreeMap<String, Selector>;

/// A rule extracting one named field from a page
#[derive(Clone)]
pub enum Selector {
    /// An XPath 1.0 expression
    Query(String),
    /// A function called with the parsed page
    Callback(SelectorFn),
}

impl Selector {
    pub fn query(query: impl Into<String>) -> Self {
        Self::Query(query.into())
    }

    pub fn callback<F>(func: F) -> Self
    where
        F: Fn(&Dom) -> Value + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(func))
    }

    /// Evaluates the selector against a page
    ///
    /// Query results that are a single-element list are collapsed to that
    /// element. Callback results are used as returned.
    pub fn select(&self, dom: &Dom) -> Result<Value, super::ExtractError> {
        match self {
            Self::Query(query) => dom.xpath(query).map(first_or_list),
            Self::Callback(func) => Ok(func(dom)),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for Selector {
    fn from(query: &str) -> Self {
        Self::Query(query.to_string())
    }
}

impl From<String> for Selector {
    fn from(query: String) -> Self {
        Self::Query(query)
    }
}

fn first_or_list(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

/// Runs every selector against a page and stores the results in `data`
///
/// A selector that fails is logged and its field left out; the others still
/// run. The raw body is dropped afterwards unless `keep_raw` is set. Without
/// selectors the page is returned untouched.
pub fn scrape(mut page: Page, selectors: &Selectors, keep_raw: bool) -> Page {
    if selectors.is_empty() {
        return page;
    }

    let data = {
        let dom = Dom::parse(page.content.as_deref().unwrap_or_default());
        let mut data = Data::new();

        for (field, selector) in selectors {
            match selector.select(&dom) {
                Ok(value) => {
                    data.insert(field.clone(), value);
                }
                Err(e) => {
                    warn!("Selector '{}' failed on {}: {}", field, page.url, e);
                }
            }
        }

        data
    };

    debug!("Extracted {} field(s) from {}", data.len(), page.url);
    page.data = Some(data);

    if !keep_raw {
        page.content = None;
    }

    page
}

/// Applies a transform function to the extracted data of a page
///
/// The function gets a copy of the data. If it fails, the error is logged
/// and the page keeps its data as it was.
pub fn transform(mut page: Page, func: &TransformFn) -> Page {
    let Some(data) = page.data.as_ref() else {
        return page;
    };

    match func(data.clone()) {
        Ok(new_data) => page.data = Some(new_data),
        Err(e) => warn!("Transform failed on {}: {:#}", page.url, e),
    }

    page
}
