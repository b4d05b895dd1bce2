//! Server-side analytics export
//!
//! The exporter runs independently of the dashboard controller: it takes
//! the filter captured when the export was requested and never touches the
//! result store.

use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use traceboard_core::export_format::{ExportContents, parse_export};
use traceboard_core::query::ExportFormat;
use traceboard_core::{AnalyticsService, FilterState, QueryParams, Result, TraceboardError};
use tracing::info;

/// Export payload as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write the payload into `dir` under its export name
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|e| TraceboardError::ExportFailure(Box::new(e.into())))?;
        info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }

    /// Re-import the summary and section sizes from the payload
    pub fn summary(&self) -> Result<ExportContents> {
        parse_export(&self.bytes, self.format)
    }
}

/// Requests exports from an [`AnalyticsService`]
#[derive(Clone)]
pub struct Exporter {
    service: Arc<dyn AnalyticsService>,
}

impl Exporter {
    pub fn new(service: Arc<dyn AnalyticsService>) -> Self {
        Self { service }
    }

    /// Export `filter` in `format`, named after today's date
    pub async fn export(&self, filter: &FilterState, format: ExportFormat) -> Result<ExportedFile> {
        self.export_dated(filter, format, Utc::now().date_naive())
            .await
    }

    /// Export with an explicit date in the file name
    pub async fn export_dated(
        &self,
        filter: &FilterState,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<ExportedFile> {
        let wrap = |e: TraceboardError| TraceboardError::ExportFailure(Box::new(e));

        let params = QueryParams::from_filter(filter).map_err(wrap)?;
        let bytes = self.service.export(&params, format).await.map_err(wrap)?;

        let file = ExportedFile {
            file_name: format.file_name(date),
            format,
            bytes,
        };
        info!("Exported {} ({} bytes)", file.file_name, file.bytes.len());
        Ok(file)
    }
}
