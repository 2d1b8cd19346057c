//! # Embedding capability
//!
//! The fusion engine and retriever only see the [`Embedder`] trait. Queries
//! and passages are framed differently because E5-style models embed them
//! asymmetrically; implementations must apply that framing themselves.

pub mod e5;

use std::sync::Arc;

use crate::error::Result;

pub use e5::E5Embedder;

/// Prefix applied to search queries before encoding.
pub const QUERY_PREFIX: &str = "query: ";
/// Prefix applied to non-empty passages before encoding.
pub const PASSAGE_PREFIX: &str = "passage: ";
/// Text encoded when an empty query reaches the embedder directly.
pub const EMPTY_QUERY_PLACEHOLDER: &str = "(empty query)";
/// Default number of passages encoded per forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Text-to-vector capability shared by index builds and queries.
pub trait Embedder {
    /// Identifier of the underlying model, recorded in build manifests.
    fn model_id(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dim(&self) -> usize;

    /// Encodes passages with passage framing into unit vectors, in input order.
    ///
    /// Empty texts must not fail; the vector returned for them is arbitrary.
    fn encode_passages(&self, texts: &[&str], batch_size: usize) -> Result<Vec<Vec<f32>>>;

    /// Encodes one search query with query framing into a unit vector.
    fn encode_query(&self, text: &str) -> Result<Vec<f32>>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn encode_passages(&self, texts: &[&str], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        (**self).encode_passages(texts, batch_size)
    }

    fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode_query(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn encode_passages(&self, texts: &[&str], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        (**self).encode_passages(texts, batch_size)
    }

    fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode_query(text)
    }
}

/// Applies query framing. Empty queries become [`EMPTY_QUERY_PLACEHOLDER`].
#[must_use]
pub fn frame_query(text: &str) -> String {
    let t = text.trim();
    let t = if t.is_empty() { EMPTY_QUERY_PLACEHOLDER } else { t };
    format!("{QUERY_PREFIX}{t}")
}

/// Applies passage framing. Empty passages are passed through as `""`.
#[must_use]
pub fn frame_passage(text: &str) -> String {
    let t = text.trim();
    if t.is_empty() {
        String::new()
    } else {
        format!("{PASSAGE_PREFIX}{t}")
    }
}

/// Euclidean norm of a vector.
#[must_use]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scales `v` to unit length. A zero vector is divided by 1.0 and stays zero.
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = l2_norm(v);
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for x in v.iter_mut() {
        *x /= norm;
    }
}
