use std::time::Duration;

use deepcrawl::{Crawler, FetchError, RunOptions, Settings};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{mount_page, mount_site, start_url};

#[tokio::test]
async fn test_full_site_crawl() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server)).build().unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let base = server.uri();
    let depth = |route: &str| {
        crawler
            .results()
            .iter()
            .find(|p| p.url == format!("{}{}", base, route))
            .map(|p| p.depth)
    };

    assert_eq!(crawler.results().len(), 4);
    assert_eq!(depth("/"), Some(0));
    assert_eq!(depth("/about"), Some(1));
    assert_eq!(depth("/blog"), Some(1));
    assert_eq!(depth("/blog/post-1"), Some(2));
    assert!(crawler.errors().is_empty());
    assert_eq!(crawler.stats().max_depth_reached, 2);
}

#[tokio::test]
async fn test_ignored_extension_is_never_requested() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a.pdf">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/b", "<p>b</p>").await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut crawler = Crawler::builder(start_url(&server)).build().unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let home = &crawler.results()[0];
    assert_eq!(home.links, vec![format!("{}/b", server.uri())]);
}

#[tokio::test]
async fn test_max_depth_zero_fetches_only_start() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            max_depth: 0,
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    assert_eq!(crawler.results().len(), 1);
    let home = &crawler.results()[0];
    assert_eq!(home.depth, 0);
    assert_eq!(
        home.links,
        vec![format!("{}/about", server.uri()), format!("{}/blog", server.uri())]
    );
}

#[tokio::test]
async fn test_no_page_deeper_than_max_depth() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            max_depth: 1,
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    assert_eq!(crawler.results().len(), 3);
    assert!(crawler.results().iter().all(|p| p.depth <= 1));
}

#[tokio::test]
async fn test_title_selector() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><head><title>Hi</title></head></html>").await;

    let mut crawler = Crawler::builder(start_url(&server))
        .select("title", "string(//title[1])")
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let page = &crawler.results()[0];
    assert_eq!(page.data, json!({"title": "Hi"}).as_object().cloned());
    assert!(page.content.is_none());
}

#[tokio::test]
async fn test_keep_raw_content() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><head><title>Hi</title></head></html>").await;

    let mut crawler = Crawler::builder(start_url(&server))
        .select("title", "string(//title[1])")
        .build()
        .unwrap();
    crawler
        .run(RunOptions {
            keep_raw_content: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert!(crawler.results()[0].content.as_deref().unwrap().contains("<title>Hi</title>"));
}

#[tokio::test]
async fn test_transform_runs_after_selectors() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server))
        .select("title", "string(//title)")
        .transform(|mut data| {
            let title = data
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_lowercase();
            data.insert("slug".to_string(), json!(title.replace(' ', "-")));
            Ok(data)
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let post = crawler
        .results()
        .iter()
        .find(|p| p.url.ends_with("/blog/post-1"))
        .unwrap();
    assert_eq!(post.field("title"), Some(&json!("Post 1")));
    assert_eq!(post.field("slug"), Some(&json!("post-1")));
}

#[tokio::test]
async fn test_timeout_goes_to_errors() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/slow">slow</a><a href="/fast">fast</a>"#).await;
    mount_page(&server, "/fast", "<p>fast</p>").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("late", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            request_timeout: 0.5,
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    let slow = format!("{}/slow", server.uri());
    assert_eq!(crawler.errors().get(&slow), Some(&FetchError::Timeout));
    assert!(crawler.results().iter().all(|p| p.url != slow));
    assert_eq!(crawler.results().len(), 2);
    assert_eq!(crawler.stats().errors, 1);
}

#[tokio::test]
async fn test_results_and_errors_are_disjoint() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/ok">ok</a><a href="/missing">missing</a><a href="/slow">slow</a>"#,
    )
    .await;
    mount_page(&server, "/ok", r#"<a href="/slow">slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            request_timeout: 0.5,
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    for page in crawler.results() {
        assert!(!crawler.errors().contains_key(&page.url));
    }

    // Non-2xx responses with a body are pages, not errors
    let missing = crawler
        .results()
        .iter()
        .find(|p| p.url.ends_with("/missing"))
        .unwrap();
    assert_eq!(missing.status_code, 404);
    assert_eq!(crawler.errors().len(), 1);
}

#[tokio::test]
async fn test_peak_in_flight_respects_concurrency() {
    let server = MockServer::start().await;
    let anchors: String = (0..10).map(|i| format!(r#"<a href="/p/{}">p</a>"#, i)).collect();
    mount_page(&server, "/", &anchors).await;
    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/p/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>leaf</p>", "text/html")
                    .set_delay(Duration::from_millis(100)),
            )
            .mount(&server)
            .await;
    }

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            max_concurrency: 2,
            ..Settings::default()
        })
        .build()
        .unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    assert_eq!(crawler.results().len(), 11);
    assert!(crawler.stats().peak_in_flight <= 2);
    assert!(crawler.stats().peak_in_flight >= 1);
}

#[tokio::test]
async fn test_sorted_results() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server)).build().unwrap();
    crawler
        .run(RunOptions {
            sort_results: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let urls: Vec<&String> = crawler.results().iter().map(|p| &p.url).collect();
    assert!(urls.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_second_run_replaces_results() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let mut crawler = Crawler::builder(start_url(&server)).build().unwrap();
    crawler.run(RunOptions::default()).await.unwrap();
    crawler.run(RunOptions::default()).await.unwrap();

    assert_eq!(crawler.results().len(), 4);
}
