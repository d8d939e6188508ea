//! CSV record loader.
//!
//! This module reads a feedback CSV and validates each row into a
//! [`RawRecord`]. Loading is all-or-nothing: the first bad row aborts
//! the load and no partial dataset is returned.

use crate::config::LoaderConfig;
use crate::models::RawRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort a load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required column is missing from the header row.
    #[error("CSV must contain a '{column}' column (found: {found})")]
    Schema { column: String, found: String },

    /// A date cell could not be parsed.
    #[error("row {row}: cannot parse date '{value}'")]
    Format { row: usize, value: String },

    /// A feedback cell is empty.
    #[error("row {row}: feedback text is empty")]
    EmptyText { row: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load records from a CSV file on disk.
pub fn load_file(path: &Path, config: &LoaderConfig) -> Result<Vec<RawRecord>, LoadError> {
    info!("Loading feedback from: {}", path.display());
    let file = File::open(path)?;
    load_records(file, config)
}

/// Load records from any CSV source.
pub fn load_records<R: Read>(source: R, config: &LoaderConfig) -> Result<Vec<RawRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let text_idx = column_index(&headers, &config.text_column)?;
    let date_idx = column_index(&headers, &config.date_column)?;
    debug!(
        "Using columns '{}' (#{}) and '{}' (#{})",
        config.text_column, text_idx, config.date_column, date_idx
    );

    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result?;

        let text = record.get(text_idx).unwrap_or("");
        if text.trim().is_empty() {
            return Err(LoadError::EmptyText { row });
        }

        let raw_date = record.get(date_idx).unwrap_or("");
        let date = parse_date(raw_date, &config.date_formats).ok_or_else(|| LoadError::Format {
            row,
            value: raw_date.to_string(),
        })?;

        records.push(RawRecord::new(text, date));
    }

    info!("Loaded {} feedback rows", records.len());
    Ok(records)
}

/// Find a column by exact header name.
fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::Schema {
            column: name.to_string(),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })
}

/// Parse a date cell, trying each format in order.
///
/// Values carrying a time of day are truncated to their calendar date.
/// RFC 3339 timestamps are always accepted in addition to `formats`.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}
