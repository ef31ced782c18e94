//! Exporter trait and error types

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the results of a crawl somewhere
///
/// An exporter is built for one run from the crawl's domain, its pages and
/// its settings (see [`ExporterSpec`](super::ExporterSpec)), then asked to
/// export once.
pub trait Exporter {
    fn export(&self) -> OutputResult<()>;
}
