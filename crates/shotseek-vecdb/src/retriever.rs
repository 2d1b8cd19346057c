//! # Scene Retriever
//!
//! Loads a built artifact set once and answers natural-language queries
//! with thresholded, ranked shot hits.

use std::path::PathBuf;

use shotseek_core::embed::Embedder;
use shotseek_core::timeparse::time_to_seconds;
use shotseek_core::types::{BuildManifest, SearchHit};
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactLayout, read_manifest};
use crate::error::{Result, VecDbError};
use crate::flat::{FlatIpIndex, Neighbors};
use crate::metadata::MetadataTable;

/// Minimum similarity a hit must reach to be returned.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.842;
/// Upper bound applied to `top_k`.
pub const MAX_TOP_K: usize = 50;

/// Configuration for loading and querying an artifact set.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieverConfig {
    /// Artifact locations.
    pub artifacts: ArtifactLayout,
    /// Hits scoring strictly below this are dropped.
    pub score_threshold: f32,
    /// `top_k` is clamped into `1..=max_top_k`.
    pub max_top_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactLayout::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_top_k: MAX_TOP_K,
        }
    }
}

impl RetrieverConfig {
    /// Create a configuration reading from `artifact_dir`.
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: ArtifactLayout::new(artifact_dir),
            ..Self::default()
        }
    }

    /// Replace the artifact layout.
    pub fn with_artifacts(mut self, artifacts: ArtifactLayout) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Set the score threshold.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Set the largest accepted `top_k` (minimum 1).
    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k.max(1);
        self
    }

    /// Clamps a requested `top_k` into `1..=max_top_k`.
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        top_k.clamp(1, self.max_top_k.max(1))
    }
}

/// Read-only query service over one artifact set.
pub struct SceneRetriever<E> {
    embedder: E,
    index: FlatIpIndex,
    metadata: MetadataTable,
    manifest: Option<BuildManifest>,
    config: RetrieverConfig,
}

impl<E: Embedder> SceneRetriever<E> {
    /// Loads the index and metadata named by `config`.
    ///
    /// # Errors
    ///
    /// - `ArtifactNotFound` if the index or metadata file is absent
    /// - `SizeMismatch` if they disagree on the number of shots
    /// - `DimensionMismatch` if the index was built for another vector size
    /// - `ManifestMismatch` if a manifest is present but describes another index
    pub fn open(embedder: E, config: RetrieverConfig) -> Result<Self> {
        let layout = &config.artifacts;
        layout.ensure_present()?;

        let index = FlatIpIndex::load(layout.index_path())?;
        let metadata = MetadataTable::read(layout.meta_path())?;
        if index.ntotal() != metadata.len() {
            return Err(VecDbError::SizeMismatch {
                vectors: index.ntotal(),
                rows: metadata.len(),
            });
        }
        if index.dim() != embedder.dim() {
            return Err(VecDbError::DimensionMismatch {
                position: 0,
                expected: index.dim(),
                actual: embedder.dim(),
            });
        }

        let manifest = if layout.manifest_path().exists() {
            let manifest = read_manifest(layout.manifest_path())?;
            check_manifest(&manifest, &index)?;
            if manifest.model_id != embedder.model_id() {
                warn!(
                    built_with = %manifest.model_id,
                    querying_with = embedder.model_id(),
                    "query model differs from build model"
                );
            }
            Some(manifest)
        } else {
            warn!(path = %layout.manifest_path().display(), "build manifest missing");
            None
        };

        info!(
            vectors = index.ntotal(),
            dim = index.dim(),
            dir = %layout.dir().display(),
            "loaded shot index"
        );

        Ok(Self {
            embedder,
            index,
            metadata,
            manifest,
            config,
        })
    }

    /// Returns up to `top_k` shots matching `query`, best first.
    ///
    /// Empty or whitespace-only queries return no hits. `top_k` is clamped
    /// into `1..=max_top_k`. The only error is an embedding failure.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let top_k = self.config.clamp_top_k(top_k);
        let embedding = self.embedder.encode_query(query)?;
        let neighbors = self.index.search(&embedding, top_k)?;
        let hits = rank_neighbors(&neighbors, &self.metadata, self.config.score_threshold);

        let raw = neighbors.iter().filter(|(_, position)| position.is_some()).count();
        debug!(query, top_k, raw, kept = hits.len(), "searched shots");
        Ok(hits)
    }

    /// Number of indexed shots.
    pub fn len(&self) -> usize {
        self.index.ntotal()
    }

    /// Returns `true` if the index holds no shots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Manifest of the loaded build, if one was found.
    pub fn manifest(&self) -> Option<&BuildManifest> {
        self.manifest.as_ref()
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

/// Rejects a manifest whose row count or dimension disagrees with `index`.
fn check_manifest(manifest: &BuildManifest, index: &FlatIpIndex) -> Result<()> {
    for (field, recorded, actual) in [
        ("rows", manifest.rows, index.ntotal()),
        ("dim", manifest.embedding_dim, index.dim()),
    ] {
        if recorded != actual {
            return Err(VecDbError::ManifestMismatch {
                field,
                manifest: recorded,
                index: actual,
            });
        }
    }
    Ok(())
}

/// Turns raw neighbors into ranked hits.
///
/// Sentinel slots are skipped, scores strictly below `threshold` are
/// dropped, and survivors are ranked `1..=M` in the given order.
pub fn rank_neighbors(
    neighbors: &Neighbors,
    metadata: &MetadataTable,
    threshold: f32,
) -> Vec<SearchHit> {
    neighbors
        .iter()
        .filter_map(|(score, position)| Some((score, position?)))
        .filter(|&(score, _)| score >= threshold)
        .filter_map(|(score, position)| metadata.get(position).map(|row| (score, row)))
        .enumerate()
        .map(|(i, (score, row))| {
            let start_time = row.start_time.trim().to_string();
            SearchHit {
                rank: i + 1,
                shot_id: row.shot_id.trim().to_string(),
                start_sec: time_to_seconds(start_time.as_str()),
                start_time,
                score,
                title: row.title.trim().to_string(),
                characters: row.characters.trim().to_string(),
            }
        })
        .collect()
}
