use thiserror::Error;

/// Errors that can occur while composing, embedding, or fusing shot text.
#[derive(Debug, Error)]
pub enum ShotseekError {
    /// The model files could not be found or loaded.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Tokenizer failure (loading or encoding).
    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    /// A vector did not have the dimension the embedder declared.
    #[error("embedding dimension mismatch at row {row}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Position of the offending vector.
        row: usize,
        /// Declared model dimension.
        expected: usize,
        /// Length actually returned.
        actual: usize,
    },

    /// The embedder returned a different number of vectors than texts given.
    #[error("embedder returned {actual} vectors for {expected} texts")]
    BatchSizeMismatch {
        /// Number of input texts.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },

    /// An invalid fusion or retrieval configuration was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Candle ML framework error.
    #[error("ML inference error: {0}")]
    CandleError(String),
}

impl From<candle_core::Error> for ShotseekError {
    fn from(err: candle_core::Error) -> Self {
        Self::CandleError(err.to_string())
    }
}

/// Result type alias for shotseek core operations.
pub type Result<T> = std::result::Result<T, ShotseekError>;
