use std::fmt;

use serde::{Deserialize, Serialize};

use super::shot::ShotField;

/// Default fusion weight of the video group.
pub const WEIGHT_VIDEO: f32 = 0.6;
/// Default fusion weight of the dialogue group.
pub const WEIGHT_DIALOGUE: f32 = 0.4;

/// Fields describing what is on screen, in composition order.
pub const VIDEO_FIELDS: &[ShotField] = &[
    ShotField::DetailedCaption,
    ShotField::VisualDetails,
    ShotField::Location,
    ShotField::Actions,
    ShotField::Mood,
    ShotField::Characters,
];

/// Fields describing what is said or told, in composition order.
pub const DIALOGUE_FIELDS: &[ShotField] = &[ShotField::SttText, ShotField::Narrative];

/// A fixed partition of shot fields that is embedded as one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldGroup {
    Video,
    Dialogue,
}

impl FieldGroup {
    /// Member fields of the group, in composition order.
    #[must_use]
    pub fn fields(self) -> &'static [ShotField] {
        match self {
            Self::Video => VIDEO_FIELDS,
            Self::Dialogue => DIALOGUE_FIELDS,
        }
    }

    /// Column names of the member fields.
    #[must_use]
    pub fn field_names(self) -> Vec<String> {
        self.fields().iter().map(|f| f.name().to_string()).collect()
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Dialogue => write!(f, "dialogue"),
        }
    }
}

/// Per-group weights applied when fusing group embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub video: f32,
    pub dialogue: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            video: WEIGHT_VIDEO,
            dialogue: WEIGHT_DIALOGUE,
        }
    }
}

impl FusionWeights {
    /// Creates a weight pair.
    #[must_use]
    pub fn new(video: f32, dialogue: f32) -> Self {
        Self { video, dialogue }
    }

    /// Weight of the given group.
    #[must_use]
    pub fn weight(&self, group: FieldGroup) -> f32 {
        match group {
            FieldGroup::Video => self.video,
            FieldGroup::Dialogue => self.dialogue,
        }
    }

    /// Validates that weights are finite, non-negative and sum to approximately 1.0.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let finite = self.video.is_finite() && self.dialogue.is_finite();
        let non_negative = self.video >= 0.0 && self.dialogue >= 0.0;
        finite && non_negative && (self.video + self.dialogue - 1.0).abs() < 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_valid() {
        let weights = FusionWeights::default();
        assert!(weights.is_valid());
        assert_eq!(weights.weight(FieldGroup::Video), 0.6);
        assert_eq!(weights.weight(FieldGroup::Dialogue), 0.4);
    }

    #[test]
    fn invalid_weights_detected() {
        assert!(!FusionWeights::new(0.7, 0.7).is_valid());
        assert!(!FusionWeights::new(1.2, -0.2).is_valid());
        assert!(!FusionWeights::new(f32::NAN, 0.4).is_valid());
        assert!(FusionWeights::new(1.0, 0.0).is_valid());
    }

    #[test]
    fn group_fields_are_disjoint_and_ordered() {
        assert_eq!(
            FieldGroup::Video.field_names(),
            vec![
                "detailed_caption",
                "visual_details",
                "location",
                "actions",
                "mood",
                "characters"
            ]
        );
        assert_eq!(FieldGroup::Dialogue.field_names(), vec!["stt_text", "narrative"]);
        for field in VIDEO_FIELDS {
            assert!(!DIALOGUE_FIELDS.contains(field));
        }
    }

    #[test]
    fn weights_serialize_with_group_keys() {
        let json = serde_json::to_value(FusionWeights::default()).unwrap();
        assert!((json["video"].as_f64().unwrap() - 0.6).abs() < 1e-6);
        assert!((json["dialogue"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }
}
