//! # Shotseek VecDB
//!
//! Exact inner-product index over fused shot embeddings, with the metadata
//! table and manifest that travel with it.
//!
//! - [`IndexBuilder`] turns a shot CSV into a persisted artifact set
//! - [`SceneRetriever`] loads an artifact set and answers queries
//! - [`FlatIpIndex`] is the underlying similarity index

pub mod artifacts;
pub mod builder;
pub mod csvio;
pub mod error;
pub mod flat;
pub mod metadata;
pub mod retriever;
pub mod source;

pub use artifacts::{ArtifactLayout, INDEX_FILE, MANIFEST_FILE, META_FILE};
pub use builder::{BuildConfig, BuildReport, IndexBuilder};
pub use error::{Result, VecDbError};
pub use flat::{FlatIpIndex, Neighbors};
pub use metadata::{MetadataRow, MetadataTable, TitleSource};
pub use retriever::{DEFAULT_SCORE_THRESHOLD, MAX_TOP_K, RetrieverConfig, SceneRetriever};
pub use source::{REQUIRED_COLUMNS, ShotSource, load_shots};
