use std::fmt;

use serde::{Deserialize, Serialize};

/// Named per-shot text fields produced by the upstream captioning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotField {
    /// Rich caption of the shot; also the preferred display title.
    DetailedCaption,
    VisualDetails,
    Location,
    Actions,
    Mood,
    /// Comma-separated character list.
    Characters,
    /// Speech-to-text transcript.
    SttText,
    /// Narrative summary of the shot.
    Narrative,
}

impl ShotField {
    /// Every known field, in source column order.
    pub const ALL: [ShotField; 8] = [
        Self::DetailedCaption,
        Self::VisualDetails,
        Self::Location,
        Self::Actions,
        Self::Mood,
        Self::Characters,
        Self::SttText,
        Self::Narrative,
    ];

    /// Column name used in CSV sources and the build manifest.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DetailedCaption => "detailed_caption",
            Self::VisualDetails => "visual_details",
            Self::Location => "location",
            Self::Actions => "actions",
            Self::Mood => "mood",
            Self::Characters => "characters",
            Self::SttText => "stt_text",
            Self::Narrative => "narrative",
        }
    }

    /// Looks up a field by its column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for ShotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of source data describing a single shot.
///
/// Optional fields are `None` when the source has no such column. When the
/// column exists, missing values have already been replaced by `""` at
/// ingestion, so consumers never deal with NA markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Unique shot key.
    pub shot_id: String,
    /// Free-form start time ("0:01:41", "101", ...).
    pub start_time: String,
    /// Free-form end time.
    pub end_time: Option<String>,
    pub detailed_caption: Option<String>,
    pub visual_details: Option<String>,
    pub location: Option<String>,
    pub actions: Option<String>,
    pub mood: Option<String>,
    pub characters: Option<String>,
    pub stt_text: Option<String>,
    pub narrative: Option<String>,
}

impl ShotRecord {
    /// Creates a record with only the required columns populated.
    #[must_use]
    pub fn new(shot_id: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            shot_id: shot_id.into(),
            start_time: start_time.into(),
            ..Self::default()
        }
    }

    /// Sets the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    /// Sets a named text field.
    #[must_use]
    pub fn with_field(mut self, field: ShotField, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    /// Returns the value of a text field, `None` if the column is absent.
    #[must_use]
    pub fn field(&self, field: ShotField) -> Option<&str> {
        match field {
            ShotField::DetailedCaption => self.detailed_caption.as_deref(),
            ShotField::VisualDetails => self.visual_details.as_deref(),
            ShotField::Location => self.location.as_deref(),
            ShotField::Actions => self.actions.as_deref(),
            ShotField::Mood => self.mood.as_deref(),
            ShotField::Characters => self.characters.as_deref(),
            ShotField::SttText => self.stt_text.as_deref(),
            ShotField::Narrative => self.narrative.as_deref(),
        }
    }

    /// Mutable access to the storage slot of a text field.
    pub fn slot_mut(&mut self, field: ShotField) -> &mut Option<String> {
        match field {
            ShotField::DetailedCaption => &mut self.detailed_caption,
            ShotField::VisualDetails => &mut self.visual_details,
            ShotField::Location => &mut self.location,
            ShotField::Actions => &mut self.actions,
            ShotField::Mood => &mut self.mood,
            ShotField::Characters => &mut self.characters,
            ShotField::SttText => &mut self.stt_text,
            ShotField::Narrative => &mut self.narrative,
        }
    }
}
