use deepcrawl::storage::{open_cache, CacheStore};
use deepcrawl::{Crawler, DeepcrawlError, RunOptions, Settings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use crate::{mount_page, mount_site, start_url};

fn cached_settings(cache_dir: &std::path::Path, delta_crawl: bool) -> Settings {
    Settings {
        caching: true,
        delta_crawl,
        cache_dir: cache_dir.to_path_buf(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_caching_stores_every_result() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(cached_settings(dir.path(), false))
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let cached = crawler.cache().unwrap();
    assert_eq!(cached.len(), 4);
    assert!(cached.iter().any(|p| p.url == start_url(&server)));
}

#[tokio::test]
async fn test_delta_crawl_skips_cached_pages() {
    let dir = tempfile::tempdir().unwrap();

    // First run: the site only has the home page and /old
    let first = MockServer::start().await;
    mount_page(&first, "/", r#"<a href="/old">old</a>"#).await;
    mount_page(&first, "/old", "<p>old</p>").await;

    let mut crawler = Crawler::builder(start_url(&first))
        .settings(cached_settings(dir.path(), true))
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();
    assert_eq!(crawler.results().len(), 2);
    let domain = crawler.domain().to_string();
    drop(crawler);

    // Second run against the same cache: /old must not be requested again
    first.reset().await;
    mount_page(&first, "/", r#"<a href="/old">old</a><a href="/new">new</a>"#).await;
    mount_page(&first, "/new", r#"<a href="/old">old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&first)
        .await;

    let mut crawler = Crawler::builder(start_url(&first))
        .settings(cached_settings(dir.path(), true))
        .build()
        .unwrap();
    assert_eq!(crawler.domain(), domain);
    crawler.run(RunOptions::default()).await.unwrap();

    let urls: Vec<&str> = crawler.results().iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| !u.ends_with("/old")));
    assert!(urls.iter().any(|u| u.ends_with("/new")));
    assert_eq!(crawler.stats().skipped_cached, 1);

    // Cached pages from the first run are kept, new ones are added
    assert_eq!(crawler.cache().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delta_crawl_always_fetches_start_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>home</p>").await;
    let dir = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        let mut crawler = Crawler::builder(start_url(&server))
            .settings(cached_settings(dir.path(), true))
            .build()
            .unwrap();
        crawler.run(RunOptions::default()).await.unwrap();
        assert_eq!(crawler.results().len(), 1);
    }
}

#[tokio::test]
async fn test_forced_caching_without_cache_settings() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            cache_dir: dir.path().to_path_buf(),
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler
        .run(RunOptions {
            force_caching: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert!(matches!(crawler.cache(), Err(DeepcrawlError::CacheDisabled)));
    assert!(!crawler.settings().caching_enabled());

    let store = open_cache(dir.path(), crawler.domain()).unwrap();
    assert_eq!(store.len().unwrap(), 4);
}

#[tokio::test]
async fn test_dump_and_clear_cache() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(cached_settings(dir.path(), false))
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let dump = dir.path().join("dump.json");
    let written = crawler.dump_cache(Some(&dump)).unwrap();
    assert_eq!(written, dump);

    let pages: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&dump).unwrap()).unwrap();
    assert_eq!(pages.len(), 4);

    assert_eq!(crawler.clear_cache().unwrap(), 4);
    assert!(crawler.cache().unwrap().is_empty());
}
