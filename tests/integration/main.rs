//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive full
//! crawl runs end-to-end.

mod config_tests;
mod crawl_tests;
mod delta_tests;
mod export_tests;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as HTML at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// Start URL of a mock server
pub fn start_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// A small three-level site:
///
/// ```text
/// /            -> /about, /blog, /report.pdf
/// /about       -> /
/// /blog        -> /blog/post-1, /about
/// /blog/post-1 -> (nothing)
/// ```
pub async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/about">About</a>
            <a href="/blog">Blog</a>
            <a href="/report.pdf">Report</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/about",
        r#"<html><head><title>About</title></head><body><a href="/">Home</a></body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/blog",
        r#"<html><head><title>Blog</title></head><body>
            <a href="/blog/post-1#comments">Post</a>
            <a href="/about">About</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/blog/post-1",
        r#"<html><head><title>Post 1</title></head><body><h1>First</h1></body></html>"#,
    )
    .await;
}
