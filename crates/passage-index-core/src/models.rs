//! Core data models shared by the build and query pipelines.
//!
//! [`Chunk`] and [`ChunkFile`] are persisted as JSON by the application;
//! [`SearchResult`] is produced per query and never stored.

use serde::{Deserialize, Serialize};

/// Windowing parameters recorded on every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_size: usize,
    pub overlap: usize,
}

/// One overlapping token window of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Creation-order id, unique within the document, starting at 0.
    pub chunk_id: usize,
    /// Window tokens rejoined with single spaces.
    pub text: String,
    /// File name of the owning document.
    pub source_file: String,
    /// Starting token offset in the document.
    pub position: usize,
    /// Number of tokens in the window.
    pub word_count: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Token span `[position, position + word_count)`.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.position..self.position + self.word_count
    }
}

/// Persisted chunk metadata for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFile {
    pub file_name: String,
    pub total_chunks: usize,
    pub chunks: Vec<Chunk>,
}

impl ChunkFile {
    pub fn new(file_name: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            file_name: file_name.into(),
            total_chunks: chunks.len(),
            chunks,
        }
    }
}

/// A ranked hit returned by [`crate::search::search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub source_file: String,
    pub chunk_id: usize,
    pub text: String,
    /// Raw squared L2 distance (lower is closer).
    pub score: f32,
    /// `1 / (1 + score)`, in `(0, 1]`.
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk {
            chunk_id: 1,
            text: "c d e".to_string(),
            source_file: "doc.txt".to_string(),
            position: 2,
            word_count: 3,
            metadata: ChunkMetadata {
                chunk_size: 3,
                overlap: 1,
            },
        }
    }

    #[test]
    fn test_span() {
        assert_eq!(chunk().span(), 2..5);
    }

    #[test]
    fn test_chunk_file_json_shape() {
        let file = ChunkFile::new("doc.txt", vec![chunk()]);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["file_name"], "doc.txt");
        assert_eq!(json["total_chunks"], 1);
        assert_eq!(json["chunks"][0]["position"], 2);
        assert_eq!(json["chunks"][0]["metadata"]["overlap"], 1);
    }
}
