//! Data extraction from fetched pages
//!
//! Selectors turn a page body into named fields, and an optional transform
//! function rewrites those fields afterwards. Both run over every page once
//! traversal is complete.

pub mod builtin;
mod dom;
mod selector;

use thiserror::Error;

pub use dom::Dom;
pub use selector::{scrape, transform, Selector, SelectorFn, Selectors, TransformFn};

/// Failure to evaluate a query against a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid XPath '{query}': {message}")]
    XPath { query: String, message: String },

    #[error("Invalid CSS selector '{query}': {message}")]
    Css { query: String, message: String },
}
