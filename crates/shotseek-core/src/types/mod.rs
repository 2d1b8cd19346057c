pub mod group;
pub mod hit;
pub mod manifest;
pub mod shot;

pub use group::{DIALOGUE_FIELDS, FieldGroup, FusionWeights, VIDEO_FIELDS};
pub use hit::SearchHit;
pub use manifest::BuildManifest;
pub use shot::{ShotField, ShotRecord};
