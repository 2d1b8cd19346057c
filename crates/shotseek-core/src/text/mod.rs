pub mod compositor;

pub use compositor::{
    EMPTY_SCENE_PLACEHOLDER, ShotTexts, compose, compose_group, fallback_text, join_fields,
};
