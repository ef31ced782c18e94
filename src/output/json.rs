use std::fs::File;
use std::io::{BufWriter, Write};

use tracing::info;

use super::{export_path, Exporter, OutputResult};
use crate::config::Settings;
use crate::page::Page;

/// Writes all pages as one pretty-printed JSON array
///
/// The file goes to `<export_to>/<domain>-<timestamp>.json`.
pub struct JsonExporter<'a> {
    domain: &'a str,
    pages: &'a [Page],
    settings: &'a Settings,
}

impl<'a> JsonExporter<'a> {
    pub fn new(domain: &'a str, pages: &'a [Page], settings: &'a Settings) -> Self {
        Self {
            domain,
            pages,
            settings,
        }
    }
}

impl Exporter for JsonExporter<'_> {
    fn export(&self) -> OutputResult<()> {
        let path = export_path(&self.settings.export_to, self.domain, "json")?;

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, self.pages)?;
        writer.flush()?;

        info!("Exported {} pages to: {}", self.pages.len(), path.display());
        Ok(())
    }
}
