use std::path::PathBuf;

use shotseek_core::ShotseekError;
use thiserror::Error;

/// Errors raised while building, persisting, loading, or querying a shot index.
#[derive(Debug, Error)]
pub enum VecDbError {
    /// The source CSV does not exist.
    #[error("CSV not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source CSV lacks columns the build cannot run without.
    #[error("CSV {} missing required columns: {columns:?}", path.display())]
    MissingColumns {
        /// Offending file.
        path: PathBuf,
        /// Names of the absent columns.
        columns: Vec<String>,
    },

    /// An index, metadata, or manifest artifact is absent.
    #[error("{kind} not found: {}", path.display())]
    ArtifactNotFound {
        /// Which artifact ("index", "metadata", ...).
        kind: &'static str,
        /// Expected location.
        path: PathBuf,
    },

    /// Index and metadata disagree on the number of shots.
    #[error("index size ({vectors}) != meta rows ({rows}); rebuild artifacts")]
    SizeMismatch {
        /// Vectors in the index.
        vectors: usize,
        /// Rows in the metadata table.
        rows: usize,
    },

    /// The build manifest describes a different index than the one on disk.
    #[error("manifest {field} ({manifest}) != index {field} ({index}); rebuild artifacts")]
    ManifestMismatch {
        /// `"rows"` or `"dim"`.
        field: &'static str,
        /// Value recorded in the manifest.
        manifest: usize,
        /// Value read from the index.
        index: usize,
    },

    /// A vector does not match the index dimension.
    #[error("dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Position of the offending vector (0 for queries).
        position: usize,
        /// Index dimension.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// The index file exists but is not a valid shot index.
    #[error("corrupt index file: {0}")]
    CorruptIndex(String),

    /// Safetensors serialization error.
    #[error("safetensors error: {0}")]
    SafeTensors(String),

    /// Embedding or fusion error from the core crate.
    #[error(transparent)]
    Core(#[from] ShotseekError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for shotseek index operations.
pub type Result<T> = std::result::Result<T, VecDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_message_mentions_rebuild() {
        let err = VecDbError::SizeMismatch {
            vectors: 10,
            rows: 9,
        };
        assert_eq!(
            err.to_string(),
            "index size (10) != meta rows (9); rebuild artifacts"
        );
    }

    #[test]
    fn missing_columns_lists_names() {
        let err = VecDbError::MissingColumns {
            path: PathBuf::from("shots.csv"),
            columns: vec!["start_time".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("shots.csv"));
        assert!(msg.contains("start_time"));
    }

    #[test]
    fn core_errors_pass_through() {
        let err: VecDbError = ShotseekError::InferenceError("boom".into()).into();
        assert_eq!(err.to_string(), "inference error: boom");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VecDbError>();
    }
}
