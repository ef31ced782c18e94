use std::collections::BTreeSet;

use serde_json::Value;
use tracing::info;

use super::{export_path, Exporter, OutputResult};
use crate::config::Settings;
use crate::page::Page;

/// Writes one row per page: `url`, `status_code`, `depth`, then every data field
///
/// Data columns are the sorted union of the fields of all pages; a page
/// without a field leaves its cell empty. Strings are written as they are,
/// other values as JSON.
pub struct CsvExporter<'a> {
    domain: &'a str,
    pages: &'a [Page],
    settings: &'a Settings,
}

impl<'a> CsvExporter<'a> {
    pub fn new(domain: &'a str, pages: &'a [Page], settings: &'a Settings) -> Self {
        Self {
            domain,
            pages,
            settings,
        }
    }

    fn data_columns(&self) -> Vec<&'a str> {
        let columns: BTreeSet<&str> = self
            .pages
            .iter()
            .filter_map(|page| page.data.as_ref())
            .flat_map(|data| data.keys().map(String::as_str))
            .collect();

        columns.into_iter().collect()
    }
}

impl Exporter for CsvExporter<'_> {
    fn export(&self) -> OutputResult<()> {
        let path = export_path(&self.settings.export_to, self.domain, "csv")?;
        let columns = self.data_columns();

        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["url", "status_code", "depth"];
        header.extend(columns.iter().copied());
        writer.write_record(&header)?;

        for page in self.pages {
            let mut row = vec![
                page.url.clone(),
                page.status_code.to_string(),
                page.depth.to_string(),
            ];
            for column in &columns {
                row.push(cell(page.field(column)));
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;

        info!("Exported {} pages to: {}", self.pages.len(), path.display());
        Ok(())
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
