//! # Text Compositor
//!
//! Builds the per-group composite strings that are fed to the embedder.
//! Field order is fixed per group and fully determines the output; no
//! reordering or deduplication happens here.

use crate::types::{FieldGroup, ShotField, ShotRecord};

/// Placeholder embedded for a shot that has neither usable text nor an id.
pub const EMPTY_SCENE_PLACEHOLDER: &str = "(empty scene)";

/// The two composite texts of one shot. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShotTexts {
    pub video: String,
    pub dialogue: String,
}

impl ShotTexts {
    /// Composite text of the given group.
    #[must_use]
    pub fn get(&self, group: FieldGroup) -> &str {
        match group {
            FieldGroup::Video => &self.video,
            FieldGroup::Dialogue => &self.dialogue,
        }
    }

    /// Returns `true` if neither group produced any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.video.trim().is_empty() && self.dialogue.trim().is_empty()
    }
}

/// Joins the trimmed, non-empty values of `fields` with single spaces.
///
/// Absent columns contribute nothing.
///
/// # Examples
/// ```
/// use shotseek_core::text::join_fields;
/// use shotseek_core::types::{ShotField, ShotRecord};
///
/// let record = ShotRecord::new("S1", "0:00:03")
///     .with_field(ShotField::Location, "  kitchen ")
///     .with_field(ShotField::Mood, "tense");
///
/// let text = join_fields(&record, &[ShotField::Location, ShotField::Actions, ShotField::Mood]);
/// assert_eq!(text, "kitchen tense");
/// ```
pub fn join_fields(record: &ShotRecord, fields: &[ShotField]) -> String {
    let mut out = String::new();
    for &field in fields {
        let value = record.field(field).unwrap_or("").trim();
        if value.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(value);
    }
    out.trim().to_string()
}

/// Composite text of one group for a record.
pub fn compose_group(record: &ShotRecord, group: FieldGroup) -> String {
    join_fields(record, group.fields())
}

/// Builds both group texts for a record.
pub fn compose(record: &ShotRecord) -> ShotTexts {
    ShotTexts {
        video: compose_group(record, FieldGroup::Video),
        dialogue: compose_group(record, FieldGroup::Dialogue),
    }
}

/// Text embedded in place of a shot whose groups are both empty.
pub fn fallback_text<'a>(shot_id: &'a str, placeholder: &'a str) -> &'a str {
    let sid = shot_id.trim();
    if sid.is_empty() { placeholder } else { sid }
}
