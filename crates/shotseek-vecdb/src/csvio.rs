//! CSV helpers shared by the shot source loader and the metadata table.
//!
//! Files are written as UTF-8 with a leading byte-order mark so spreadsheet
//! tools open Korean and other non-ASCII text correctly; readers strip it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord, Writer, WriterBuilder};

use crate::error::Result;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell values treated as missing and replaced by `""` on load.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Replaces missing-value markers with the empty string.
pub fn normalize_missing(value: &str) -> String {
    if NA_VALUES.contains(&value.trim()) {
        String::new()
    } else {
        value.to_string()
    }
}

/// Opens a CSV file for reading, skipping a leading BOM.
pub fn open_reader(path: &Path) -> Result<Reader<Cursor<Vec<u8>>>> {
    let mut bytes = std::fs::read(path)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    Ok(ReaderBuilder::new()
        .flexible(true)
        .from_reader(Cursor::new(bytes)))
}

/// Creates a CSV file for writing, emitting a leading BOM.
pub fn create_writer(path: &Path) -> Result<Writer<File>> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    Ok(WriterBuilder::new().from_writer(file))
}

/// Maps trimmed header names to column positions.
pub fn header_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect()
}

/// Reads a cell by optional column position, normalizing missing values.
pub fn cell(record: &StringRecord, column: Option<usize>) -> String {
    column
        .and_then(|i| record.get(i))
        .map(normalize_missing)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn na_markers_become_empty() {
        for marker in ["NaN", "nan", "NA", "N/A", "null", "None", "  ", ""] {
            assert_eq!(normalize_missing(marker), "", "marker {marker:?}");
        }
        assert_eq!(normalize_missing("Nana"), "Nana");
        assert_eq!(normalize_missing(" kept "), " kept ");
    }

    #[test]
    fn bom_is_written_and_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");

        let mut writer = create_writer(&path).unwrap();
        writer.write_record(["shot_id", "title"]).unwrap();
        writer.write_record(["S1", "비 오는 날"]).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let raw = std::fs::read(&path).unwrap();
        assert!(raw.starts_with(UTF8_BOM));

        let mut reader = open_reader(&path).unwrap();
        let headers = header_index(reader.headers().unwrap());
        assert_eq!(headers.get("shot_id"), Some(&0));

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(cell(&row, headers.get("title").copied()), "비 오는 날");
        assert_eq!(cell(&row, None), "");
    }

    #[test]
    fn short_rows_read_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "a,b,c\n1,2\n").unwrap();

        let mut reader = open_reader(&path).unwrap();
        let headers = header_index(reader.headers().unwrap());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(cell(&row, headers.get("b").copied()), "2");
        assert_eq!(cell(&row, headers.get("c").copied()), "");
    }
}
