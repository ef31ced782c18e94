//! Ready-made callback selectors for common page fields
//!
//! ```no_run
//! use deepcrawl::extract::builtin;
//! use deepcrawl::{Crawler, Selector};
//!
//! let crawler = Crawler::builder("https://example.com/")
//!     .select("title", Selector::callback(builtin::title))
//!     .select("images", Selector::callback(builtin::images))
//!     .build();
//! ```
//!
//! From a project file the same selectors are available by name with a
//! `builtin:` prefix, e.g. `title = "builtin:title"`.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Dom, Selector};

/// Prefix marking a built-in selector in a project file
pub const PREFIX: &str = "builtin:";

/// Names of every built-in selector
pub const NAMES: &[&str] = &[
    "title",
    "headings",
    "paragraphs",
    "text",
    "meta",
    "canonicals",
    "schemas",
    "emails",
    "images",
];

/// Looks up a built-in selector by name
pub fn by_name(name: &str) -> Option<Selector> {
    let func: fn(&Dom) -> Value = match name {
        "title" => title,
        "headings" => headings,
        "paragraphs" => paragraphs,
        "text" => text,
        "meta" => meta,
        "canonicals" => canonicals,
        "schemas" => schemas,
        "emails" => emails,
        "images" => images,
        _ => return None,
    };

    Some(Selector::Callback(Arc::new(func)))
}

/// Text of the first `<title>`
pub fn title(dom: &Dom) -> Value {
    dom.xpath("normalize-space(//title[1])").unwrap_or(Value::Null)
}

/// Text of every heading, grouped by level
pub fn headings(dom: &Dom) -> Value {
    let levels: Map<String, Value> = (1..=6)
        .map(|level| {
            let tag = format!("h{}", level);
            let texts = texts(dom, &format!("//{}", tag));
            (tag, texts)
        })
        .collect();

    Value::Object(levels)
}

/// Text of every `<p>`
pub fn paragraphs(dom: &Dom) -> Value {
    texts(dom, "//p")
}

/// Visible text of the body, whitespace collapsed
pub fn text(dom: &Dom) -> Value {
    let parts = strings(
        dom,
        "//body//text()[not(ancestor::script) and not(ancestor::style) and not(ancestor::noscript)]",
    );

    let joined = parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    Value::String(joined)
}

/// `<meta name=.. content=..>` pairs
pub fn meta(dom: &Dom) -> Value {
    let mut tags = Map::new();

    for element in dom.elements("meta[name]").unwrap_or_default() {
        let el = element.value();
        if let Some(name) = el.attr("name") {
            let content = el.attr("content").unwrap_or_default();
            tags.insert(name.to_string(), Value::String(content.to_string()));
        }
    }

    Value::Object(tags)
}

/// Targets of `<link rel="canonical">`
pub fn canonicals(dom: &Dom) -> Value {
    list(strings(dom, "//link[@rel='canonical']/@href"))
}

/// Schema names of `itemtype` attributes (`https://schema.org/Article` gives `Article`)
pub fn schemas(dom: &Dom) -> Value {
    let names = strings(dom, "//*[@itemtype]/@itemtype")
        .into_iter()
        .filter_map(|link| {
            link.trim_end_matches('/')
                .rsplit('/')
                .next()
                .map(str::to_string)
        })
        .filter(|name| !name.is_empty())
        .collect();

    list(names)
}

/// Addresses of `mailto:` links
pub fn emails(dom: &Dom) -> Value {
    let addresses = strings(dom, "//a[starts-with(@href, 'mailto:')]/@href")
        .into_iter()
        .filter_map(|href| {
            let address = href.trim_start_matches("mailto:");
            let address = address.split('?').next().unwrap_or_default().trim();
            (!address.is_empty()).then(|| address.to_string())
        })
        .collect();

    list(addresses)
}

/// Sources of `<img>` tags
pub fn images(dom: &Dom) -> Value {
    list(strings(dom, "//img/@src"))
}

fn strings(dom: &Dom, query: &str) -> Vec<String> {
    dom.xpath_strings(query).unwrap_or_default()
}

/// Trimmed, non-empty string values of a node-set
fn texts(dom: &Dom, query: &str) -> Value {
    let values = strings(dom, query)
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    list(values)
}

fn list(values: Vec<String>) -> Value {
    Value::Array(values.into_iter().map(Value::String).collect())
}
