use serde::{Deserialize, Serialize};

/// A single ranked result returned by a shot search.
///
/// Hits are created per query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank among the hits that passed the score threshold.
    pub rank: usize,

    pub shot_id: String,

    /// Start time exactly as stored in the metadata table.
    pub start_time: String,

    /// `start_time` normalized to seconds.
    pub start_sec: f64,

    /// Inner-product similarity to the query (cosine, since vectors are unit-norm).
    pub score: f32,

    /// Display title derived at build time.
    pub title: String,

    pub characters: String,
}
