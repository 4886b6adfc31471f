//! CSV and JSON export of output records

use crate::error::{SyncError, SyncResult};
use dm_core::OutputRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File formats records can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Write records as CSV with one column per field, in `fields` order.
///
/// Booleans render as `True`/`False`, timestamps as UTC ISO-8601 and nulls
/// as empty cells.
pub fn write_csv<W: Write>(writer: W, fields: &[&str], records: &[OutputRecord]) -> SyncResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(fields)?;
    for record in records {
        wtr.write_record(
            fields
                .iter()
                .map(|f| record.get(f).map(|v| v.render()).unwrap_or_default()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records as a pretty-printed JSON array of objects
pub fn write_json<W: Write>(mut writer: W, records: &[OutputRecord]) -> SyncResult<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Export to a file, replacing it
pub fn export_to_path(
    path: &Path,
    format: ExportFormat,
    fields: &[&str],
    records: &[OutputRecord],
) -> SyncResult<()> {
    let file = File::create(path).map_err(|e| SyncError::Export {
        path: path.display().to_string(),
        source: e,
    })?;
    let writer = BufWriter::new(file);
    match format {
        ExportFormat::Csv => write_csv(writer, fields, records),
        ExportFormat::Json => write_json(writer, records),
    }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
