//! Embedding trait and vector encoding helpers.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus pure helpers for encoding vectors as little-endian bytes.
//!
//! Concrete providers (OpenAI, Ollama, fastembed) live in the
//! `passage-index` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Maps text to fixed-length float vectors.
///
/// Implementations must be length- and order-preserving: output row `i`
/// is the embedding of input text `i`. Dimensionality is fixed for the
/// lifetime of an instance.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Encode a float vector as little-endian `f32` bytes.
///
/// # Example
///
/// ```rust
/// use passage_index_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian `f32` bytes back into a float vector.
///
/// Trailing bytes that do not form a whole `f32` are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_length() {
        let blob = vec_to_blob(&[0.0; 7]);
        assert_eq!(blob.len(), 28);
    }

    #[test]
    fn test_blob_ignores_trailing_bytes() {
        let mut blob = vec_to_blob(&[1.5, -4.0]);
        blob.push(0xff);
        assert_eq!(blob_to_vec(&blob), vec![1.5, -4.0]);
    }
}
