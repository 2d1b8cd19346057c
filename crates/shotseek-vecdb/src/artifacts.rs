//! On-disk layout of a built shot index.
//!
//! A build produces three sibling files in one directory: the vector index,
//! the metadata CSV, and a JSON manifest describing how the vectors were made.

use std::fs;
use std::path::{Path, PathBuf};

use shotseek_core::types::BuildManifest;
use tracing::debug;

use crate::error::{Result, VecDbError};

pub const INDEX_FILE: &str = "shots.index";
pub const META_FILE: &str = "meta.csv";
pub const MANIFEST_FILE: &str = "build_info.json";

const STAGING_SUFFIX: &str = ".tmp";

/// File locations of one artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
    index_file: String,
    meta_file: String,
    manifest_file: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new("artifacts")
    }
}

impl ArtifactLayout {
    /// Layout with the standard file names inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index_file: INDEX_FILE.to_string(),
            meta_file: META_FILE.to_string(),
            manifest_file: MANIFEST_FILE.to_string(),
        }
    }

    /// Override the index file name.
    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    /// Override the metadata file name.
    pub fn with_meta_file(mut self, name: impl Into<String>) -> Self {
        self.meta_file = name.into();
        self
    }

    /// Override the manifest file name.
    pub fn with_manifest_file(mut self, name: impl Into<String>) -> Self {
        self.manifest_file = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(&self.index_file)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(&self.meta_file)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(&self.manifest_file)
    }

    /// Temporary sibling a file is written to before being renamed into place.
    pub fn staging_path(final_path: &Path) -> PathBuf {
        let mut name = final_path.as_os_str().to_os_string();
        name.push(STAGING_SUFFIX);
        PathBuf::from(name)
    }

    /// Fails with `ArtifactNotFound` for the first of index/metadata that is absent.
    pub fn ensure_present(&self) -> Result<()> {
        for (kind, path) in [("index", self.index_path()), ("metadata", self.meta_path())] {
            if !path.exists() {
                return Err(VecDbError::ArtifactNotFound { kind, path });
            }
        }
        Ok(())
    }

    /// Renames staged files over their final names.
    ///
    /// Called only after every staged file was written. The manifest goes
    /// first and the index last, so a rename that fails part way leaves a
    /// manifest that no longer describes the index and the set is rejected
    /// at load.
    pub fn commit(&self) -> Result<()> {
        for path in [self.manifest_path(), self.meta_path(), self.index_path()] {
            let staged = Self::staging_path(&path);
            fs::rename(&staged, &path)?;
            debug!(path = %path.display(), "committed artifact");
        }
        Ok(())
    }

    /// Removes leftover staged files, ignoring ones that do not exist.
    pub fn discard_staged(&self) {
        for path in [self.index_path(), self.meta_path(), self.manifest_path()] {
            let _ = fs::remove_file(Self::staging_path(&path));
        }
    }
}

/// Writes a manifest as pretty-printed JSON.
pub fn write_manifest(manifest: &BuildManifest, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads a manifest written by [`write_manifest`].
pub fn read_manifest(path: impl AsRef<Path>) -> Result<BuildManifest> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VecDbError::ArtifactNotFound {
            kind: "manifest",
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
