use std::fs;
use std::path::{Path, PathBuf};

use deepcrawl::output::{ExporterSpec, Exporter, OutputError, OutputResult};
use deepcrawl::{Crawler, Page, RunOptions, Settings};
use wiremock::MockServer;

use crate::{mount_site, start_url};

fn exported(dir: &Path, extension: &str) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| p.extension().map_or(false, |e| e == extension))
        .collect()
}

struct Failing;

impl Exporter for Failing {
    fn export(&self) -> OutputResult<()> {
        Err(OutputError::Format("always fails".to_string()))
    }
}

fn failing<'a>(_: &'a str, _: &'a [Page], _: &'a Settings) -> Box<dyn Exporter + 'a> {
    Box::new(Failing)
}

#[tokio::test]
async fn test_json_and_csv_exports() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut crawler = Crawler::builder(start_url(&server))
        .settings(Settings {
            export_to: dir.path().to_path_buf(),
            exporters: vec![
                ExporterSpec::custom("failing", failing),
                ExporterSpec::Json,
                ExporterSpec::Csv,
            ],
            ..Settings::default()
        })
        .select("title", "string(//title)")
        .build()
        .unwrap();
    crawler
        .run(RunOptions {
            sort_results: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let json_files = exported(dir.path(), "json");
    assert_eq!(json_files.len(), 1);
    let pages: Vec<Page> = serde_json::from_str(&fs::read_to_string(&json_files[0]).unwrap()).unwrap();
    assert_eq!(pages, crawler.results());

    let csv_files = exported(dir.path(), "csv");
    assert_eq!(csv_files.len(), 1);
    let csv = fs::read_to_string(&csv_files[0]).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("url,status_code,depth,title"));
    assert_eq!(
        lines.next(),
        Some(format!("{}/,200,0,Home", server.uri()).as_str())
    );
    assert_eq!(lines.count(), 3);
}
