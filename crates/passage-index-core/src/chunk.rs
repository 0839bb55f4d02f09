//! Sliding-window text chunker.
//!
//! Splits document text into whitespace-delimited tokens and emits
//! overlapping fixed-size windows as [`Chunk`]s. Each chunk records its
//! starting token offset and token count so spans can be reconstructed
//! without the original text.
//!
//! # Algorithm
//!
//! 1. Tokenize: every maximal run of non-whitespace characters is a token.
//! 2. `step = chunk_size - overlap`.
//! 3. Emit `tokens[start..start + chunk_size]` for `start = 0, step, 2*step, …`
//!    while `start < tokens.len()`. The last window may be short.
//! 4. Detokenize each window by joining tokens with a single space.
//!
//! Detokenization does not reproduce the original whitespace.
//!
//! # Example
//!
//! ```rust
//! use passage_index_core::chunk::{window, WindowParams};
//!
//! let params = WindowParams::new(4, 2).unwrap();
//! let chunks = window("a b c d e f", "doc.txt", params);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[1].position, 2);
//! assert_eq!(chunks[2].text, "e f");
//! ```

use crate::error::{Error, Result};
use crate::models::{Chunk, ChunkMetadata};

/// Validated windowing parameters.
///
/// Construction through [`WindowParams::new`] guarantees a positive stride,
/// so [`window`] always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    chunk_size: usize,
    overlap: usize,
}

impl WindowParams {
    /// Validate `chunk_size` and `overlap`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] when `chunk_size == 0` or
    /// `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts. Always positive.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split text into whitespace-delimited tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Rejoin tokens with single spaces.
pub fn detokenize(tokens: &[&str]) -> String {
    tokens.join(" ")
}

/// Window `text` into overlapping chunks owned by `source_file`.
///
/// Empty or whitespace-only text yields no chunks.
pub fn window(text: &str, source_file: &str, params: WindowParams) -> Vec<Chunk> {
    let tokens = tokenize(text);
    let metadata = ChunkMetadata {
        chunk_size: params.chunk_size,
        overlap: params.overlap,
    };

    (0..tokens.len())
        .step_by(params.step())
        .enumerate()
        .map(|(chunk_id, start)| {
            let end = start.saturating_add(params.chunk_size).min(tokens.len());
            let window_tokens = &tokens[start..end];
            Chunk {
                chunk_id,
                text: detokenize(window_tokens),
                source_file: source_file.to_string(),
                position: start,
                word_count: window_tokens.len(),
                metadata,
            }
        })
        .collect()
}

/// Validate raw parameters and window `text` in one call.
///
/// # Errors
///
/// [`Error::InvalidConfiguration`] for parameters rejected by
/// [`WindowParams::new`]; nothing is tokenized in that case.
pub fn window_text(
    text: &str,
    source_file: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>> {
    let params = WindowParams::new(chunk_size, overlap)?;
    Ok(window(text, source_file, params))
}
