//! Output module for exporting crawl results
//!
//! This module handles:
//! - Exporting pages as JSON or CSV files
//! - Plugging in custom exporters
//! - Recording and printing crawl statistics

mod csv;
mod json;
pub mod stats;
mod traits;

pub use self::csv::CsvExporter;
pub use json::JsonExporter;
pub use stats::{print_errors, print_statistics, CrawlStats};
pub use traits::{Exporter, OutputError, OutputResult};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::config::Settings;
use crate::page::Page;

/// Builds an exporter for one run
pub type ExporterFactory =
    for<'a> fn(&'a str, &'a [Page], &'a Settings) -> Box<dyn Exporter + 'a>;

/// Which exporter to run after a crawl
///
/// In a project file exporters are listed by name: `exporters = ["json", "csv"]`.
#[derive(Clone)]
pub enum ExporterSpec {
    Json,
    Csv,
    Custom {
        name: String,
        factory: ExporterFactory,
    },
}

impl ExporterSpec {
    pub fn custom(name: impl Into<String>, factory: ExporterFactory) -> Self {
        Self::Custom {
            name: name.into(),
            factory,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Custom { name, .. } => name,
        }
    }

    /// Creates the exporter for one run
    pub fn build<'a>(
        &self,
        domain: &'a str,
        pages: &'a [Page],
        settings: &'a Settings,
    ) -> Box<dyn Exporter + 'a> {
        match self {
            Self::Json => Box::new(JsonExporter::new(domain, pages, settings)),
            Self::Csv => Box::new(CsvExporter::new(domain, pages, settings)),
            Self::Custom { factory, .. } => factory(domain, pages, settings),
        }
    }
}

impl fmt::Debug for ExporterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("Json"),
            Self::Csv => f.write_str("Csv"),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for ExporterSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(serde::de::Error::custom(format!(
                "unknown exporter '{}', expected \"json\" or \"csv\"",
                other
            ))),
        }
    }
}

/// Path of a new export file, creating the export directory if needed
///
/// Files are named `<domain>-<timestamp>.<extension>`; a port separator in
/// the domain is replaced by `_`.
pub fn export_path(export_to: &Path, domain: &str, extension: &str) -> OutputResult<PathBuf> {
    std::fs::create_dir_all(export_to)?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S");
    let name = format!("{}-{}.{}", domain.replace(':', "_"), timestamp, extension);

    Ok(export_to.join(name))
}
