use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use thiserror::Error;

use crate::grid::display_value;
use crate::grid::format::format_datetime;
use crate::record::{FieldDescriptor, Record};

pub const FIXED_HEADERS: [&str; 3] = ["ID", "Title", "Created"];
const FALLBACK_LIST_NAME: &str = "data";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no records to export")]
    NoRecords,

    #[error("failed to write export file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn quote_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_line<S: AsRef<str>>(cells: &[S]) -> String {
    cells.iter().map(|cell| quote_cell(cell.as_ref())).join(",")
}

pub fn header_row(fields: &[FieldDescriptor]) -> Vec<String> {
    FIXED_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(fields.iter().map(|f| f.display_title.clone()))
        .collect()
}

pub fn export_row(record: &Record, fields: &[FieldDescriptor]) -> Vec<String> {
    let id = record.get("Id").map(|v| v.to_string()).unwrap_or_default();
    let title = record
        .get("Title")
        .filter(|v| !v.is_absent())
        .map(|v| v.to_string())
        .unwrap_or_default();
    let created = match record.get("Created").filter(|v| !v.is_absent()) {
        Some(value) => format_datetime(value).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "created timestamp not exportable");
            String::new()
        }),
        None => String::new(),
    };

    let mut row = vec![id, title, created];
    row.extend(fields.iter().map(|field| display_value(record, field)));
    row
}

// Records are written in fetch order, unsorted and unpaginated.
pub fn export(records: &[Record], fields: &[FieldDescriptor]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(csv_line(&header_row(fields)));
    for record in records {
        lines.push(csv_line(&export_row(record, fields)));
    }
    Ok(lines.join("\n"))
}

pub fn export_file_name(list_name: &str, now: DateTime<Utc>) -> String {
    let list_name = list_name.trim();
    let list_name = if list_name.is_empty() {
        FALLBACK_LIST_NAME
    } else {
        list_name
    };
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("{list_name}_{stamp}.csv")
}

pub fn write_export(
    dir: &Path,
    list_name: &str,
    records: &[Record],
    fields: &[FieldDescriptor],
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let csv = export(records, fields)?;
    let path = dir.join(export_file_name(list_name, now));
    std::fs::write(&path, csv).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), records = records.len(), "csv export written");
    Ok(path)
}
