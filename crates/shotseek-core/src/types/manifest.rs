use serde::{Deserialize, Serialize};

use super::group::{FieldGroup, FusionWeights};

/// Provenance record written next to the index by every build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Identifier of the embedding model used for passages.
    pub model_id: String,

    /// Dimension of every stored vector.
    pub embedding_dim: usize,

    pub weights: FusionWeights,

    pub video_fields: Vec<String>,

    pub dialogue_fields: Vec<String>,

    /// Source CSV the build was run against.
    pub csv_path: String,

    /// Number of shots (index vectors and metadata rows).
    pub rows: usize,
}

impl BuildManifest {
    /// Creates a manifest using the fixed field groups.
    #[must_use]
    pub fn new(
        model_id: impl Into<String>,
        embedding_dim: usize,
        weights: FusionWeights,
        csv_path: impl Into<String>,
        rows: usize,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            embedding_dim,
            weights,
            video_fields: FieldGroup::Video.field_names(),
            dialogue_fields: FieldGroup::Dialogue.field_names(),
            csv_path: csv_path.into(),
            rows,
        }
    }
}
