//! # Embedding Fusion Engine
//!
//! Turns the two composite texts of every shot into one unit vector:
//!
//! 1. encode all video texts and all dialogue texts as passages
//! 2. zero out the embedding of any empty group text
//! 3. `fused = w_video * video + w_dialogue * dialogue`
//! 4. re-encode shots whose fused vector is exactly zero from their
//!    `shot_id` (or a placeholder)
//! 5. L2-normalize every row

use tracing::{debug, info};

use crate::embed::{DEFAULT_BATCH_SIZE, Embedder, l2_norm, normalize_in_place};
use crate::error::{Result, ShotseekError};
use crate::text::{EMPTY_SCENE_PLACEHOLDER, ShotTexts, compose, fallback_text};
use crate::types::{FusionWeights, ShotRecord};

/// Configuration of the fusion engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    /// Group weights.
    pub weights: FusionWeights,
    /// Passages per embedder call. Has no effect on the result.
    pub batch_size: usize,
    /// Text embedded for an all-empty shot without an id.
    pub placeholder: String,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            placeholder: EMPTY_SCENE_PLACEHOLDER.to_string(),
        }
    }
}

impl FusionConfig {
    /// Create a new fusion configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the group weights.
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the embedding batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the placeholder text for shots without text or id.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Rejects weights that do not form a convex combination.
    pub fn validate(&self) -> Result<()> {
        if !self.weights.is_valid() {
            return Err(ShotseekError::InvalidConfig(format!(
                "fusion weights must be non-negative and sum to 1.0, got video={} dialogue={}",
                self.weights.video, self.weights.dialogue
            )));
        }
        if self.placeholder.trim().is_empty() {
            return Err(ShotseekError::InvalidConfig(
                "placeholder text must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Output of a fusion run.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedEmbeddings {
    /// One unit vector per input shot, in input order.
    pub vectors: Vec<Vec<f32>>,
    /// Embedding dimension of every row.
    pub dim: usize,
    /// Rows that had no usable text and were embedded from their id.
    pub degenerate_rows: Vec<usize>,
}

impl FusedEmbeddings {
    /// Number of fused rows.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` if no rows were fused.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Weighted, masked combination of one shot's group embeddings (pre-normalization).
///
/// A group whose mask is `false` contributes exactly zero, whatever its
/// embedding holds.
pub fn weighted_sum(
    video: &[f32],
    video_present: bool,
    dialogue: &[f32],
    dialogue_present: bool,
    weights: FusionWeights,
) -> Vec<f32> {
    let wv = if video_present { weights.video } else { 0.0 };
    let wd = if dialogue_present { weights.dialogue } else { 0.0 };
    video
        .iter()
        .zip(dialogue)
        .map(|(v, d)| wv * v + wd * d)
        .collect()
}

/// Fuses per-group shot embeddings into one vector per shot.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Composes and fuses a slice of shot records.
    pub fn fuse_records<E>(&self, records: &[ShotRecord], embedder: &E) -> Result<FusedEmbeddings>
    where
        E: Embedder + ?Sized,
    {
        let texts: Vec<ShotTexts> = records.iter().map(compose).collect();
        let ids: Vec<&str> = records.iter().map(|r| r.shot_id.as_str()).collect();
        self.fuse(&texts, &ids, embedder)
    }

    /// Fuses already-composed texts. `shot_ids[i]` belongs to `texts[i]`.
    pub fn fuse<E>(&self, texts: &[ShotTexts], shot_ids: &[&str], embedder: &E) -> Result<FusedEmbeddings>
    where
        E: Embedder + ?Sized,
    {
        if texts.len() != shot_ids.len() {
            return Err(ShotseekError::InvalidConfig(format!(
                "{} composed texts but {} shot ids",
                texts.len(),
                shot_ids.len()
            )));
        }

        let n = texts.len();
        let dim = embedder.dim();
        let batch_size = self.config.batch_size;
        let weights = self.config.weights;

        let video_texts: Vec<&str> = texts.iter().map(|t| t.video.as_str()).collect();
        let dialogue_texts: Vec<&str> = texts.iter().map(|t| t.dialogue.as_str()).collect();

        let video_embs = checked(embedder.encode_passages(&video_texts, batch_size)?, n, dim)?;
        let dialogue_embs =
            checked(embedder.encode_passages(&dialogue_texts, batch_size)?, n, dim)?;
        debug!(rows = n, dim, "encoded video and dialogue groups");

        let mut vectors: Vec<Vec<f32>> = texts
            .iter()
            .zip(video_embs.iter().zip(&dialogue_embs))
            .map(|(t, (v, d))| {
                weighted_sum(
                    v,
                    !t.video.trim().is_empty(),
                    d,
                    !t.dialogue.trim().is_empty(),
                    weights,
                )
            })
            .collect();

        let degenerate_rows: Vec<usize> = vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| l2_norm(v) == 0.0)
            .map(|(i, _)| i)
            .collect();

        if !degenerate_rows.is_empty() {
            let fallback: Vec<&str> = degenerate_rows
                .iter()
                .map(|&i| fallback_text(shot_ids[i], &self.config.placeholder))
                .collect();
            let fallback_embs =
                checked(embedder.encode_passages(&fallback, batch_size)?, fallback.len(), dim)?;
            for (&row, emb) in degenerate_rows.iter().zip(fallback_embs) {
                vectors[row] = emb;
            }
            info!(
                count = degenerate_rows.len(),
                "shots without text embedded from shot_id fallback"
            );
        }

        for v in &mut vectors {
            normalize_in_place(v);
        }

        Ok(FusedEmbeddings {
            vectors,
            dim,
            degenerate_rows,
        })
    }
}

/// Verifies row count and per-row dimension of an embedder response.
fn checked(rows: Vec<Vec<f32>>, expected_rows: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    if rows.len() != expected_rows {
        return Err(ShotseekError::BatchSizeMismatch {
            expected: expected_rows,
            actual: rows.len(),
        });
    }
    if let Some((row, v)) = rows.iter().enumerate().find(|(_, v)| v.len() != dim) {
        return Err(ShotseekError::DimensionMismatch {
            row,
            expected: dim,
            actual: v.len(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::embed::{frame_passage, frame_query};
    use crate::types::ShotField;

    /// Lookup-table embedder; unknown texts map to a hashed direction.
    struct TableEmbedder {
        dim: usize,
        table: HashMap<String, Vec<f32>>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl TableEmbedder {
        fn new(dim: usize) -> Self {
            Self {
                dim,
                table: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, framed: &str, v: Vec<f32>) -> Self {
            self.table.insert(framed.to_string(), v);
            self
        }

        fn lookup(&self, framed: &str) -> Vec<f32> {
            if let Some(v) = self.table.get(framed) {
                return v.clone();
            }
            let h = framed
                .bytes()
                .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
            let mut v = vec![0.0; self.dim];
            v[(h as usize) % self.dim] = 1.0;
            v
        }
    }

    impl Embedder for TableEmbedder {
        fn model_id(&self) -> &str {
            "table"
        }

        fn dim(&self) -> usize {
            self.dim
        }

        fn encode_passages(&self, texts: &[&str], _batch_size: usize) -> Result<Vec<Vec<f32>>> {
            let framed: Vec<String> = texts.iter().map(|t| frame_passage(t)).collect();
            self.calls.borrow_mut().push(framed.clone());
            Ok(framed.iter().map(|f| self.lookup(f)).collect())
        }

        fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.lookup(&frame_query(text)))
        }
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    fn engine() -> FusionEngine {
        FusionEngine::new(FusionConfig::default()).unwrap()
    }

    #[test]
    fn weighted_sum_matches_formula() {
        let fused = weighted_sum(&[1.0, 0.0], true, &[0.0, 1.0], true, FusionWeights::default());
        assert_close(&fused, &[0.6, 0.4]);
    }

    #[test]
    fn weighted_sum_masks_absent_groups() {
        let fused = weighted_sum(&[9.0, 9.0], false, &[0.0, 1.0], true, FusionWeights::default());
        assert_close(&fused, &[0.0, 0.4]);
    }

    #[test]
    fn both_groups_fused_and_normalized() {
        let embedder = TableEmbedder::new(3)
            .with("passage: a dog", vec![1.0, 0.0, 0.0])
            .with("passage: hello", vec![0.0, 1.0, 0.0]);
        let record = ShotRecord::new("S1", "0")
            .with_field(ShotField::DetailedCaption, "a dog")
            .with_field(ShotField::SttText, "hello");

        let out = engine().fuse_records(&[record], &embedder).unwrap();

        let norm = (0.6f32 * 0.6 + 0.4 * 0.4).sqrt();
        assert_close(&out.vectors[0], &[0.6 / norm, 0.4 / norm, 0.0]);
        assert!((l2_norm(&out.vectors[0]) - 1.0).abs() < 1e-5);
        assert!(out.degenerate_rows.is_empty());
    }

    #[test]
    fn empty_video_contributes_nothing() {
        // The embedder answers "" with a strong vector that must be ignored.
        let embedder = TableEmbedder::new(3)
            .with("", vec![0.0, 0.0, 1.0])
            .with("passage: only words", vec![0.0, 1.0, 0.0]);
        let record = ShotRecord::new("S2", "0").with_field(ShotField::Narrative, "only words");

        let out = engine().fuse_records(&[record], &embedder).unwrap();
        assert_close(&out.vectors[0], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn all_empty_shot_uses_shot_id() {
        let embedder = TableEmbedder::new(3)
            .with("", vec![1.0, 1.0, 1.0])
            .with("passage: S77", vec![0.0, 3.0, 4.0]);
        let record = ShotRecord::new(" S77 ", "0").with_field(ShotField::Mood, "   ");

        let out = engine().fuse_records(&[record], &embedder).unwrap();
        assert_eq!(out.degenerate_rows, vec![0]);
        assert_close(&out.vectors[0], &[0.0, 0.6, 0.8]);
    }

    #[test]
    fn all_empty_shot_without_id_uses_placeholder() {
        let embedder = TableEmbedder::new(2).with("passage: (empty scene)", vec![2.0, 0.0]);
        let out = engine()
            .fuse_records(&[ShotRecord::new("", "0")], &embedder)
            .unwrap();
        assert_close(&out.vectors[0], &[1.0, 0.0]);
    }

    #[test]
    fn fallback_rows_are_encoded_in_one_batch() {
        let embedder = TableEmbedder::new(4);
        let records = vec![
            ShotRecord::new("A", "0"),
            ShotRecord::new("B", "0").with_field(ShotField::Location, "park"),
            ShotRecord::new("C", "0"),
        ];

        let out = engine().fuse_records(&records, &embedder).unwrap();
        assert_eq!(out.degenerate_rows, vec![0, 2]);

        let calls = embedder.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2], vec!["passage: A", "passage: C"]);
    }

    #[test]
    fn output_preserves_input_order_and_shape() {
        let embedder = TableEmbedder::new(8);
        let records: Vec<ShotRecord> = (0..10)
            .map(|i| ShotRecord::new(format!("S{i}"), "0").with_field(ShotField::Actions, format!("act {i}")))
            .collect();

        let out = engine().fuse_records(&records, &embedder).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out.dim, 8);
        for (i, v) in out.vectors.iter().enumerate() {
            let expected = embedder.lookup(&format!("passage: act {i}"));
            assert_close(v, &expected);
        }
    }

    #[test]
    fn pathological_zero_vector_stays_zero() {
        // Embedder returns zeros even for the fallback text.
        let embedder = TableEmbedder::new(2)
            .with("", vec![0.0, 0.0])
            .with("passage: Z", vec![0.0, 0.0]);
        let out = engine()
            .fuse_records(&[ShotRecord::new("Z", "0")], &embedder)
            .unwrap();
        assert_close(&out.vectors[0], &[0.0, 0.0]);
    }

    #[test]
    fn wrong_dimension_is_fatal() {
        let embedder = TableEmbedder::new(3).with("passage: x", vec![1.0, 0.0]);
        let record = ShotRecord::new("S", "0").with_field(ShotField::Mood, "x");
        let err = engine().fuse_records(&[record], &embedder).unwrap_err();
        assert!(matches!(
            err,
            ShotseekError::DimensionMismatch {
                row: 0,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn custom_weights_apply() {
        let embedder = TableEmbedder::new(2)
            .with("passage: v", vec![1.0, 0.0])
            .with("passage: d", vec![0.0, 1.0]);
        let config = FusionConfig::new().with_weights(FusionWeights::new(0.5, 0.5));
        let record = ShotRecord::new("S", "0")
            .with_field(ShotField::Location, "v")
            .with_field(ShotField::Narrative, "d");

        let out = FusionEngine::new(config)
            .unwrap()
            .fuse_records(&[record], &embedder)
            .unwrap();
        let h = 0.5f32.sqrt();
        assert_close(&out.vectors[0], &[h, h]);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = FusionConfig::new().with_weights(FusionWeights::new(0.9, 0.9));
        assert!(matches!(
            FusionEngine::new(config),
            Err(ShotseekError::InvalidConfig(_))
        ));

        let config = FusionConfig::new().with_placeholder("  ");
        assert!(FusionEngine::new(config).is_err());
    }

    #[test]
    fn batch_size_is_clamped() {
        assert_eq!(FusionConfig::new().with_batch_size(0).batch_size, 1);
        assert_eq!(FusionConfig::default().batch_size, 32);
    }
}
