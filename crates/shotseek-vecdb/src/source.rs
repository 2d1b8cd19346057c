//! Loads shot records from the captioning pipeline's CSV output.

use std::path::{Path, PathBuf};

use shotseek_core::types::{ShotField, ShotRecord};
use tracing::info;

use crate::csvio::{cell, header_index, open_reader};
use crate::error::{Result, VecDbError};

/// Columns every source CSV must have.
pub const REQUIRED_COLUMNS: &[&str] = &["shot_id", "start_time"];

/// Shot records loaded from one CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSource {
    /// File the records were read from.
    pub path: PathBuf,
    /// Header names, in file order.
    pub columns: Vec<String>,
    /// One record per data row, in file order.
    pub records: Vec<ShotRecord>,
}

impl ShotSource {
    /// Wraps records that did not come from a file.
    pub fn from_records(path: impl Into<PathBuf>, records: Vec<ShotRecord>) -> Self {
        Self {
            path: path.into(),
            columns: Vec::new(),
            records,
        }
    }

    /// Number of shots.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the source has no shots.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if the source has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Reads a shot CSV into typed records.
///
/// Missing-value markers become `""`. Known text columns that are absent
/// from the header stay `None` on every record; unknown columns are ignored.
///
/// # Errors
///
/// `VecDbError::SourceNotFound` if the file does not exist and
/// `VecDbError::MissingColumns` if `shot_id` or `start_time` is absent.
pub fn load_shots(path: impl AsRef<Path>) -> Result<ShotSource> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VecDbError::SourceNotFound(path.to_path_buf()));
    }

    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    let index = header_index(&headers);
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(VecDbError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let shot_id_col = index.get("shot_id").copied();
    let start_col = index.get("start_time").copied();
    let end_col = index.get("end_time").copied();
    let field_cols: Vec<(ShotField, usize)> = ShotField::ALL
        .into_iter()
        .filter_map(|f| index.get(f.name()).map(|&i| (f, i)))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = ShotRecord::new(cell(&row, shot_id_col), cell(&row, start_col));
        if end_col.is_some() {
            record.end_time = Some(cell(&row, end_col));
        }
        for &(field, col) in &field_cols {
            *record.slot_mut(field) = Some(cell(&row, Some(col)));
        }
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), columns = ?columns, "loaded shot CSV");

    Ok(ShotSource {
        path: path.to_path_buf(),
        columns,
        records,
    })
}
