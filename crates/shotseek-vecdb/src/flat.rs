//! # Flat Inner-Product Index
//!
//! Exact top-k search by dot product over a dense in-memory matrix. With
//! unit-norm vectors the scores are cosine similarities. Persisted as a
//! single safetensors file holding one `[n, dim]` F32 tensor.

use std::collections::HashMap;
use std::path::Path;

use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use tracing::debug;

use crate::error::{Result, VecDbError};

/// Name of the tensor holding the vectors inside the index file.
const VECTORS_TENSOR: &str = "vectors";
const FORMAT_KEY: &str = "format";
const FORMAT_VALUE: &str = "shotseek-flat-ip";

/// Result of a top-k search: exactly `k` slots in descending score order.
///
/// Slots past the number of stored vectors hold `None` positions and
/// `f32::NEG_INFINITY` scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    pub scores: Vec<f32>,
    pub positions: Vec<Option<usize>>,
}

impl Neighbors {
    /// Iterates `(score, position)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, Option<usize>)> + '_ {
        self.scores.iter().copied().zip(self.positions.iter().copied())
    }

    /// Number of slots (always the requested `k`).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no slots were requested.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Exact inner-product index over a fixed set of vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    /// Creates an empty index for vectors of length `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored vectors.
    pub fn ntotal(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    /// Appends vectors. Positions continue from the current `ntotal()`.
    ///
    /// # Errors
    ///
    /// Returns `VecDbError::DimensionMismatch` if any vector has the wrong
    /// length; nothing is added in that case.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let base = self.ntotal();
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != self.dim) {
            return Err(VecDbError::DimensionMismatch {
                position: base + i,
                expected: self.dim,
                actual: v.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// Stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.ntotal() {
            return None;
        }
        let start = position * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    /// Returns the `k` highest inner products with `query`.
    ///
    /// Equal scores keep insertion order (lower position first).
    pub fn search(&self, query: &[f32], k: usize) -> Result<Neighbors> {
        if query.len() != self.dim {
            return Err(VecDbError::DimensionMismatch {
                position: 0,
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = (0..self.ntotal())
            .map(|pos| {
                let row = &self.data[pos * self.dim..(pos + 1) * self.dim];
                (pos, dot(row, query))
            })
            .collect();
        // Stable sort keeps position order among ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let mut scores = Vec::with_capacity(k);
        let mut positions = Vec::with_capacity(k);
        for (pos, score) in scored {
            scores.push(score);
            positions.push(Some(pos));
        }
        while positions.len() < k {
            scores.push(f32::NEG_INFINITY);
            positions.push(None);
        }

        Ok(Neighbors { scores, positions })
    }

    /// Writes the index to `path` as safetensors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes: Vec<u8> = self.data.iter().flat_map(|x| x.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, vec![self.ntotal(), self.dim], &bytes)
            .map_err(|e| VecDbError::SafeTensors(e.to_string()))?;

        let metadata: HashMap<String, String> =
            HashMap::from([(FORMAT_KEY.to_string(), FORMAT_VALUE.to_string())]);
        safetensors::serialize_to_file([(VECTORS_TENSOR, &view)], &Some(metadata), path)
            .map_err(|e| VecDbError::SafeTensors(e.to_string()))?;

        debug!(path = %path.display(), vectors = self.ntotal(), dim = self.dim, "saved index");
        Ok(())
    }

    /// Reads an index previously written by [`FlatIpIndex::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = std::fs::read(path)?;
        let tensors = SafeTensors::deserialize(&buffer)
            .map_err(|e| VecDbError::CorruptIndex(format!("{}: {e}", path.display())))?;
        let view = tensors.tensor(VECTORS_TENSOR).map_err(|e| {
            VecDbError::CorruptIndex(format!("{}: no `{VECTORS_TENSOR}` tensor ({e})", path.display()))
        })?;

        if view.dtype() != Dtype::F32 {
            return Err(VecDbError::CorruptIndex(format!(
                "expected F32 vectors, found {:?}",
                view.dtype()
            )));
        }
        let (n, dim) = match view.shape() {
            [n, dim] => (*n, *dim),
            other => {
                return Err(VecDbError::CorruptIndex(format!(
                    "expected a 2-d tensor, found shape {other:?}"
                )));
            }
        };

        let data: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if data.len() != n * dim {
            return Err(VecDbError::CorruptIndex(format!(
                "shape [{n}, {dim}] does not match {} stored values",
                data.len()
            )));
        }

        debug!(path = %path.display(), vectors = n, dim, "loaded index");
        Ok(Self { dim, data })
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    fn sample_index() -> FlatIpIndex {
        let mut index = FlatIpIndex::new(3);
        index
            .add(&[
                unit(3, 0),
                vec![0.6, 0.8, 0.0],
                unit(3, 2),
            ])
            .unwrap();
        index
    }

    #[test]
    fn search_orders_by_descending_score() {
        let index = sample_index();
        let result = index.search(&unit(3, 1), 3).unwrap();

        assert_eq!(result.positions, vec![Some(1), Some(0), Some(2)]);
        assert!((result.scores[0] - 0.8).abs() < 1e-6);
        assert!(result.scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn search_pads_with_sentinels() {
        let index = sample_index();
        let result = index.search(&unit(3, 0), 5).unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result.positions[3], None);
        assert_eq!(result.positions[4], None);
        assert_eq!(result.scores[4], f32::NEG_INFINITY);
        assert_eq!(result.iter().filter(|(_, p)| p.is_some()).count(), 3);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = FlatIpIndex::new(2);
        index
            .add(&[unit(2, 1), unit(2, 0), unit(2, 0), unit(2, 0)])
            .unwrap();
        let result = index.search(&unit(2, 0), 3).unwrap();
        assert_eq!(result.positions, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn zero_k_returns_nothing() {
        let result = sample_index().search(&unit(3, 0), 0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let mut index = sample_index();
        let err = index.add(&[unit(3, 0), vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            VecDbError::DimensionMismatch {
                position: 4,
                expected: 3,
                actual: 1
            }
        ));
        assert_eq!(index.ntotal(), 3);

        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn save_and_load_preserve_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots.index");

        let index = sample_index();
        index.save(&path).unwrap();
        let loaded = FlatIpIndex::load(&path).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.vector(1), Some(&[0.6f32, 0.8, 0.0][..]));
        assert_eq!(loaded.vector(3), None);
    }

    #[test]
    fn empty_index_round_trips_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.index");

        FlatIpIndex::new(16).save(&path).unwrap();
        let loaded = FlatIpIndex::load(&path).unwrap();
        assert_eq!(loaded.dim(), 16);
        assert_eq!(loaded.ntotal(), 0);
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.index");
        std::fs::write(&path, b"definitely not safetensors").unwrap();

        assert!(matches!(
            FlatIpIndex::load(&path),
            Err(VecDbError::CorruptIndex(_))
        ));
    }
}
