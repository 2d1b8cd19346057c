//! # Shotseek Core
//!
//! Text composition, embedding fusion, and time normalization for
//! natural-language retrieval of movie shots.
//!
//! ## Quick Start
//!
//! ```rust
//! use shotseek_core::text::compose;
//! use shotseek_core::timeparse::time_to_seconds;
//! use shotseek_core::types::{ShotField, ShotRecord};
//!
//! let shot = ShotRecord::new("S001", "0:01:41")
//!     .with_field(ShotField::DetailedCaption, "Rain floods the basement")
//!     .with_field(ShotField::SttText, "Close the window!");
//!
//! let texts = compose(&shot);
//! assert_eq!(texts.video, "Rain floods the basement");
//! assert_eq!(texts.dialogue, "Close the window!");
//! assert_eq!(time_to_seconds(shot.start_time.as_str()), 101.0);
//! ```
pub mod embed;
pub mod error;
pub mod fusion;
pub mod text;
pub mod timeparse;
pub mod types;

// Re-export primary API
pub use embed::{E5Embedder, Embedder};
pub use error::{Result, ShotseekError};
pub use fusion::{FusedEmbeddings, FusionConfig, FusionEngine};
pub use text::{ShotTexts, compose};
pub use timeparse::time_to_seconds;
pub use types::{BuildManifest, FieldGroup, FusionWeights, SearchHit, ShotField, ShotRecord};
