//! Per-shot display metadata stored next to the index.
//!
//! Row `i` of the table describes the vector at index position `i`.

use std::path::Path;

use shotseek_core::types::{ShotField, ShotRecord};

use crate::csvio::{cell, create_writer, header_index, open_reader};
use crate::error::{Result, VecDbError};

/// Where a shot's display title comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    DetailedCaption,
    Narrative,
    ShotId,
}

impl TitleSource {
    /// Picks the title column for a whole source: `detailed_caption` if that
    /// column exists, otherwise `narrative`, otherwise the shot id.
    ///
    /// A column exists when any record carries a value for it, so an empty
    /// caption still wins over a present narrative.
    pub fn select(records: &[ShotRecord]) -> Self {
        let has = |field| records.iter().any(|r| r.field(field).is_some());
        if has(ShotField::DetailedCaption) {
            Self::DetailedCaption
        } else if has(ShotField::Narrative) {
            Self::Narrative
        } else {
            Self::ShotId
        }
    }

    fn title_of(self, record: &ShotRecord) -> String {
        match self {
            Self::DetailedCaption => record
                .field(ShotField::DetailedCaption)
                .unwrap_or_default()
                .to_string(),
            Self::Narrative => record
                .field(ShotField::Narrative)
                .unwrap_or_default()
                .to_string(),
            Self::ShotId => record.shot_id.clone(),
        }
    }
}

/// Display data for one indexed shot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRow {
    pub shot_id: String,
    pub start_time: String,
    pub end_time: String,
    pub characters: String,
    pub title: String,
}

/// Ordered metadata rows aligned with index positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    has_end_time: bool,
    has_characters: bool,
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    /// Projects shot records onto display rows, preserving order.
    pub fn from_records(records: &[ShotRecord]) -> Self {
        let title_source = TitleSource::select(records);
        let has_end_time = records.iter().any(|r| r.end_time.is_some());
        let has_characters = records
            .iter()
            .any(|r| r.field(ShotField::Characters).is_some());

        let rows = records
            .iter()
            .map(|r| MetadataRow {
                shot_id: r.shot_id.clone(),
                start_time: r.start_time.clone(),
                end_time: r.end_time.clone().unwrap_or_default(),
                characters: r
                    .field(ShotField::Characters)
                    .unwrap_or_default()
                    .to_string(),
                title: title_source.title_of(r),
            })
            .collect();

        Self {
            has_end_time,
            has_characters,
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for index position `position`.
    pub fn get(&self, position: usize) -> Option<&MetadataRow> {
        self.rows.get(position)
    }

    /// All rows in index order.
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["shot_id", "start_time"];
        if self.has_end_time {
            columns.push("end_time");
        }
        if self.has_characters {
            columns.push("characters");
        }
        columns.push("title");
        columns
    }

    /// Writes the table as BOM-prefixed UTF-8 CSV.
    ///
    /// Columns: `shot_id, start_time, [end_time], [characters], title`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = create_writer(path.as_ref())?;
        writer.write_record(self.columns())?;
        for row in &self.rows {
            let mut record = vec![row.shot_id.as_str(), row.start_time.as_str()];
            if self.has_end_time {
                record.push(&row.end_time);
            }
            if self.has_characters {
                record.push(&row.characters);
            }
            record.push(&row.title);
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a table written by [`MetadataTable::write`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open_reader(path)?;
        let index = header_index(reader.headers()?);
        if !index.contains_key("shot_id") {
            return Err(VecDbError::MissingColumns {
                path: path.to_path_buf(),
                columns: vec!["shot_id".into()],
            });
        }

        let col = |name: &str| index.get(name).copied();
        let (shot_id, start_time, end_time, characters, title) = (
            col("shot_id"),
            col("start_time"),
            col("end_time"),
            col("characters"),
            col("title"),
        );

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(MetadataRow {
                shot_id: cell(&record, shot_id),
                start_time: cell(&record, start_time),
                end_time: cell(&record, end_time),
                characters: cell(&record, characters),
                title: cell(&record, title),
            });
        }

        Ok(Self {
            has_end_time: end_time.is_some(),
            has_characters: characters.is_some(),
            rows,
        })
    }
}
