//! Parsed HTML documents queryable by XPath and CSS
//!
//! HTML is parsed leniently by `scraper` (html5ever), then mirrored into an
//! `sxd-document` tree so XPath 1.0 expressions can be evaluated against it.

use scraper::{ElementRef, Html, Selector as CssSelector};
use serde_json::{Number, Value};
use sxd_document::{dom, Package};
use sxd_xpath::{evaluate_xpath, Value as XPathValue};
use tracing::warn;

use super::ExtractError;

/// A parsed page
///
/// Built once per page and dropped before the next await point; the
/// underlying trees are not `Send`.
pub struct Dom {
    html: Html,
    package: Package,
}

impl Dom {
    /// Parses an HTML document
    ///
    /// Never fails: malformed markup is repaired the way browsers do it, and
    /// the parser's complaints are logged as a warning.
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);

        if !html.errors.is_empty() {
            warn!(
                "HTML parser recovered from {} error(s), first: {}",
                html.errors.len(),
                html.errors[0]
            );
        }

        let package = mirror(&html);
        Self { html, package }
    }

    /// Evaluates an XPath 1.0 expression
    ///
    /// Node-sets come back as an array of node string values in document
    /// order; strings, numbers and booleans as the matching JSON scalar.
    pub fn xpath(&self, query: &str) -> Result<Value, ExtractError> {
        let document = self.package.as_document();
        let value = evaluate_xpath(&document, query).map_err(|e| ExtractError::XPath {
            query: query.to_string(),
            message: e.to_string(),
        })?;

        Ok(to_json(value))
    }

    /// Evaluates an XPath expression and returns its result as strings
    ///
    /// A scalar result becomes a one-element list.
    pub fn xpath_strings(&self, query: &str) -> Result<Vec<String>, ExtractError> {
        let strings = match self.xpath(query)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            Value::String(s) => vec![s],
            Value::Null => Vec::new(),
            other => vec![other.to_string()],
        };

        Ok(strings)
    }

    /// Returns the text content of every element matching a CSS selector
    pub fn select(&self, css: &str) -> Result<Vec<String>, ExtractError> {
        Ok(self
            .elements(css)?
            .into_iter()
            .map(|el| el.text().collect::<String>())
            .collect())
    }

    /// Returns every element matching a CSS selector
    pub fn elements(&self, css: &str) -> Result<Vec<ElementRef<'_>>, ExtractError> {
        let selector = CssSelector::parse(css).map_err(|e| ExtractError::Css {
            query: css.to_string(),
            message: e.to_string(),
        })?;

        Ok(self.html.select(&selector).collect())
    }

    /// The underlying `scraper` document
    pub fn html(&self) -> &Html {
        &self.html
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("root", &self.html.root_element().value().name())
            .finish()
    }
}

/// Deepest element nesting kept as is in the XPath tree
///
/// Elements nested deeper are attached to their ancestor at this depth, so
/// pathological pages stay queryable without deep trees.
const MAX_MIRROR_DEPTH: usize = 1024;

/// Copies the element tree of an HTML document into an XPath-capable package
///
/// Walks the tree with an explicit stack; nesting depth of the source has no
/// effect on the call stack.
fn mirror(html: &Html) -> Package {
    let package = Package::new();
    {
        let document = package.as_document();
        let source_root = html.root_element();
        let root = document.create_element(source_root.value().name());
        document.root().append_child(root);

        let mut flattened = 0usize;
        // (source, its copy, where its child elements go, depth of the copy)
        let mut stack = vec![(source_root, root, root, 1usize)];

        while let Some((source, element, sink, depth)) = stack.pop() {
            for (name, value) in source.value().attrs() {
                element.set_attribute_value(name, value);
            }

            let mut children = Vec::new();
            for child in source.children() {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let copy = document.create_element(child_element.value().name());
                    sink.append_child(copy);

                    let child_sink = if depth + 1 < MAX_MIRROR_DEPTH {
                        copy
                    } else {
                        flattened += 1;
                        sink
                    };
                    let child_depth = (depth + 1).min(MAX_MIRROR_DEPTH);
                    children.push((child_element, copy, child_sink, child_depth));
                } else if let Some(text) = child.value().as_text() {
                    element.append_child(document.create_text(text));
                } else if let Some(comment) = child.value().as_comment() {
                    element.append_child(document.create_comment(comment));
                }
            }

            stack.extend(children.into_iter().rev());
        }

        if flattened > 0 {
            warn!(
                "Document nests deeper than {} elements; flattened {} element(s) for XPath queries",
                MAX_MIRROR_DEPTH, flattened
            );
        }
    }
    package
}

fn to_json(value: XPathValue<'_>) -> Value {
    match value {
        XPathValue::Nodeset(nodes) => Value::Array(
            nodes
                .document_order()
                .into_iter()
                .map(|node| Value::String(node.string_value()))
                .collect(),
        ),
        XPathValue::String(s) => Value::String(s),
        XPathValue::Boolean(b) => Value::Bool(b),
        XPathValue::Number(n) => number(n),
    }
}

/// XPath numbers are doubles; integral ones are reported as integers
fn number(n: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}
