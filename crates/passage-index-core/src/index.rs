//! Flat (exact) vector index over squared Euclidean distance.
//!
//! Vectors are stored contiguously in insertion order; position `i` in the
//! index is the `i`-th vector passed to [`FlatIndex::build`]. Search is a
//! full scan, so results are exact.
//!
//! # Artifact layout
//!
//! ```text
//! ┌──────────┬───────────┬────────────┬─────────────────────────────┐
//! │ PIDXFLAT │ dims: u32 │ count: u64 │ count × dims × f32 (LE)     │
//! └──────────┴───────────┴────────────┴─────────────────────────────┘
//! ```

use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::error::{Error, Result};

const MAGIC: &[u8; 8] = b"PIDXFLAT";
const HEADER_LEN: usize = 8 + 4 + 8;

/// One search hit: distance to the query and the vector's insertion position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

/// Exact nearest-neighbor index with squared L2 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from vectors that all share one non-zero dimension.
    ///
    /// The dimension is taken from the first vector. An empty input builds
    /// an empty index with dimension 0.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dims == 0 {
            return Err(Error::EmbeddingFailure(
                "embedding vectors have zero dimensions".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(dims * vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dims {
                return Err(Error::EmbeddingFailure(format!(
                    "vector {} has {} dimensions, expected {}",
                    i,
                    v.len(),
                    dims
                )));
            }
            data.extend_from_slice(v);
        }

        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector stored at `position`, if any.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dims;
        Some(&self.data[start..start + self.dims])
    }

    /// Return up to `k` nearest vectors, ascending by distance.
    ///
    /// Equal distances keep insertion order.
    ///
    /// # Errors
    ///
    /// [`Error::EmbeddingFailure`] when the query dimension differs from the
    /// index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(Error::EmbeddingFailure(format!(
                "query has {} dimensions, index expects {}",
                query.len(),
                self.dims
            )));
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(position, v)| Neighbor {
                distance: l2_squared(query, v),
                position,
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    /// Encode the index as an artifact blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&vec_to_blob(&self.data));
        bytes
    }

    /// Decode an artifact blob produced by [`FlatIndex::to_bytes`].
    ///
    /// `key` names the document in the error.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
            return Err(Error::load(key, "not a flat index artifact"));
        }
        let mut dims_buf = [0u8; 4];
        dims_buf.copy_from_slice(&bytes[8..12]);
        let mut count_buf = [0u8; 8];
        count_buf.copy_from_slice(&bytes[12..20]);
        let dims = u32::from_le_bytes(dims_buf) as usize;
        let count = u64::from_le_bytes(count_buf) as usize;

        let body = &bytes[HEADER_LEN..];
        let expected = dims
            .checked_mul(count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::load(key, "artifact header overflows"))?;
        if body.len() != expected {
            return Err(Error::load(
                key,
                format!(
                    "artifact body is {} bytes, header declares {} × {} floats",
                    body.len(),
                    count,
                    dims
                ),
            ));
        }
        if count > 0 && dims == 0 {
            return Err(Error::load(key, "artifact declares zero dimensions"));
        }

        Ok(Self {
            dims,
            data: blob_to_vec(body),
        })
    }
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        FlatIndex::build(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_l2_squared() {
        assert_eq!(l2_squared(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
        assert_eq!(l2_squared(&[3.0], &[3.0]), 0.0);
    }

    #[test]
    fn test_search_ascending() {
        let idx = sample();
        let hits = idx.search(&[0.0, 0.0], 10).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 3, 2]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[3].distance, 4.0);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let idx = sample();
        let hits = idx.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[1].position, 3);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let idx = sample();
        assert_eq!(idx.search(&[0.0, 0.0], 2).unwrap().len(), 2);
        assert!(idx.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let idx = sample();
        let err = idx.search(&[0.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::EmbeddingFailure(_)));
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        let err = FlatIndex::build(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::EmbeddingFailure(_)));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = FlatIndex::build(&[vec![], vec![]]).unwrap_err();
        assert!(matches!(err, Error::EmbeddingFailure(_)));
    }

    #[test]
    fn test_empty_index() {
        let idx = FlatIndex::build(&[]).unwrap();
        assert!(idx.is_empty());
        assert!(idx.search(&[1.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_artifact_preserves_positions() {
        let idx = sample();
        let restored = FlatIndex::from_bytes("doc", &idx.to_bytes()).unwrap();
        assert_eq!(restored, idx);
        assert_eq!(restored.vector(2), Some(&[0.0, 2.0][..]));
        assert_eq!(restored.vector(4), None);
    }

    #[test]
    fn test_truncated_artifact_rejected() {
        let bytes = sample().to_bytes();
        let err = FlatIndex::from_bytes("doc", &bytes[..bytes.len() - 3]).unwrap_err();
        match err {
            Error::IndexLoadFailure { key, .. } => assert_eq!(key, "doc"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(FlatIndex::from_bytes("doc", &bytes).is_err());
    }
}
