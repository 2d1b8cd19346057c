//! # Index Builder
//!
//! Embeds every shot of a source CSV, then persists the flat index, the
//! metadata table and the build manifest as one artifact set. Files are
//! staged next to their final names and renamed only once all three have
//! been written, so an interrupted build leaves the previous set untouched.

use std::fs;
use std::path::{Path, PathBuf};

use shotseek_core::embed::Embedder;
use shotseek_core::fusion::{FusionConfig, FusionEngine};
use shotseek_core::types::BuildManifest;
use tracing::{info, warn};

use crate::artifacts::{ArtifactLayout, write_manifest};
use crate::error::{Result, VecDbError};
use crate::flat::FlatIpIndex;
use crate::metadata::MetadataTable;
use crate::source::{ShotSource, load_shots};

/// Configuration for an index build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildConfig {
    /// Where the artifacts are written.
    pub artifacts: ArtifactLayout,
    /// Fusion weights, batch size and placeholder text.
    pub fusion: FusionConfig,
}

impl BuildConfig {
    /// Create a build configuration writing to `artifact_dir`.
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: ArtifactLayout::new(artifact_dir),
            fusion: FusionConfig::default(),
        }
    }

    /// Replace the artifact layout.
    pub fn with_artifacts(mut self, artifacts: ArtifactLayout) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Replace the fusion configuration.
    pub fn with_fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    /// Set the embedding batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.fusion = self.fusion.with_batch_size(batch_size);
        self
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Shots indexed (vectors and metadata rows).
    pub rows: usize,
    /// Vector dimension.
    pub dim: usize,
    /// Positions of shots that had no text and were embedded from their id.
    pub degenerate_rows: Vec<usize>,
    /// Manifest written with the artifacts.
    pub manifest: BuildManifest,
}

/// Builds and persists artifact sets with one embedder.
pub struct IndexBuilder<E> {
    embedder: E,
    engine: FusionEngine,
    config: BuildConfig,
}

impl<E: Embedder> IndexBuilder<E> {
    /// Create a builder, validating the fusion configuration.
    pub fn new(embedder: E, config: BuildConfig) -> Result<Self> {
        let engine = FusionEngine::new(config.fusion.clone())?;
        Ok(Self {
            embedder,
            engine,
            config,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Loads `csv_path` and builds from it.
    pub fn build_from_csv(&self, csv_path: impl AsRef<Path>) -> Result<BuildReport> {
        let source = load_shots(csv_path)?;
        self.build(&source)
    }

    /// Embeds every record of `source` and replaces the artifact set.
    pub fn build(&self, source: &ShotSource) -> Result<BuildReport> {
        let records = &source.records;
        let dim = self.embedder.dim();
        info!(
            rows = records.len(),
            model = self.embedder.model_id(),
            dim,
            "building shot index"
        );

        let fused = self.engine.fuse_records(records, &self.embedder)?;
        if fused.len() != records.len() {
            return Err(VecDbError::SizeMismatch {
                vectors: fused.len(),
                rows: records.len(),
            });
        }

        let mut index = FlatIpIndex::new(dim);
        index.add(&fused.vectors)?;
        let metadata = MetadataTable::from_records(records);
        let manifest = BuildManifest::new(
            self.embedder.model_id(),
            dim,
            self.config.fusion.weights,
            source.path.display().to_string(),
            records.len(),
        );

        self.persist(&index, &metadata, &manifest)?;

        info!(
            rows = index.ntotal(),
            dim,
            degenerate = fused.degenerate_rows.len(),
            dir = %self.config.artifacts.dir().display(),
            "wrote index artifacts"
        );

        Ok(BuildReport {
            rows: index.ntotal(),
            dim,
            degenerate_rows: fused.degenerate_rows,
            manifest,
        })
    }

    fn persist(
        &self,
        index: &FlatIpIndex,
        metadata: &MetadataTable,
        manifest: &BuildManifest,
    ) -> Result<()> {
        let layout = &self.config.artifacts;
        fs::create_dir_all(layout.dir())?;

        if let Err(e) = write_staged(layout, index, metadata, manifest) {
            warn!(error = %e, "build failed before commit; discarding staged artifacts");
            layout.discard_staged();
            return Err(e);
        }
        if let Err(e) = layout.commit() {
            warn!(error = %e, "commit failed; discarding staged artifacts");
            layout.discard_staged();
            return Err(e);
        }
        Ok(())
    }
}

fn write_staged(
    layout: &ArtifactLayout,
    index: &FlatIpIndex,
    metadata: &MetadataTable,
    manifest: &BuildManifest,
) -> Result<()> {
    index.save(ArtifactLayout::staging_path(&layout.index_path()))?;
    metadata.write(ArtifactLayout::staging_path(&layout.meta_path()))?;
    write_manifest(manifest, ArtifactLayout::staging_path(&layout.manifest_path()))
}
