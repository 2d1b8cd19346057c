//! # Shotseek
//!
//! Natural-language search over the shots of a movie.
//!
//! A captioning pipeline describes every shot in a CSV file. [`IndexBuilder`]
//! fuses each shot's visual and dialogue text into one embedding and writes
//! an index; [`SceneRetriever`] loads it and answers free-text queries with
//! ranked, timestamped hits.
//!
//! ```no_run
//! use shotseek::{BuildConfig, E5Embedder, IndexBuilder, RetrieverConfig, SceneRetriever};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = E5Embedder::load("models/multilingual-e5-small", "intfloat/multilingual-e5-small")?;
//! IndexBuilder::new(&embedder, BuildConfig::new("data/artifacts"))?
//!     .build_from_csv("data/shots.csv")?;
//!
//! let retriever = SceneRetriever::open(&embedder, RetrieverConfig::new("data/artifacts"))?;
//! for hit in retriever.search("비 오는 밤 골목길", 5)? {
//!     println!("{} {:.3} {}", hit.rank, hit.score, hit.title);
//! }
//! # Ok(())
//! # }
//! ```

pub use shotseek_core::{
    BuildManifest, E5Embedder, Embedder, FusionConfig, FusionEngine, FusionWeights, SearchHit,
    ShotField, ShotRecord, ShotseekError, time_to_seconds,
};
pub use shotseek_vecdb::{
    ArtifactLayout, BuildConfig, BuildReport, DEFAULT_SCORE_THRESHOLD, IndexBuilder,
    RetrieverConfig, SceneRetriever, ShotSource, VecDbError, load_shots,
};
