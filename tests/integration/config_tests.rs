use std::fs;

use deepcrawl::config::load_project;
use deepcrawl::{ConfigError, Crawler, DeepcrawlError, RunOptions};
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

use crate::{mount_page, start_url};

fn write_project(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("project.toml");
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_project_file_drives_a_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Quotes</title></head><body>
            <span class="text">One</span><span class="text">Two</span>
        </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let path = write_project(
        &dir,
        &format!(
            r#"
start_url = "{}"

[settings]
max_depth = 1
max_concurrency = 4

[selectors]
title = "builtin:title"
quotes = "//span[@class='text']/text()"
"#,
            start_url(&server)
        ),
    );

    let project = load_project(&path).unwrap();
    let mut crawler = Crawler::from_project(&project).unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let page = &crawler.results()[0];
    assert_eq!(page.field("title"), Some(&json!("Quotes")));
    assert_eq!(page.field("quotes"), Some(&json!(["One", "Two"])));
}

#[test]
fn test_unknown_settings_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_project(
        &dir,
        r#"
start_url = "https://example.com/"

[settings]
max_dept = 3
"#,
    );

    assert!(matches!(load_project(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_start_url_without_scheme_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_project(&dir, r#"start_url = "example.com/path""#);

    assert!(matches!(load_project(&path), Err(ConfigError::InvalidUrl(_))));
    assert!(matches!(
        Crawler::builder("example.com/path").build(),
        Err(DeepcrawlError::Config(ConfigError::InvalidUrl(_)))
    ));
}

#[test]
fn test_unknown_builtin_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_project(
        &dir,
        r#"
start_url = "https://example.com/"

[selectors]
title = "builtin:headline"
"#,
    );

    assert!(matches!(load_project(&path), Err(ConfigError::Validation(_))));
}
