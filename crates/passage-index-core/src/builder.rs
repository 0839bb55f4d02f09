//! Per-document index construction.
//!
//! All chunk texts of a document go to the embedder in one batch, and the
//! returned rows become a [`FlatIndex`] whose position `i` is the chunk with
//! `chunk_id == i`.

use tracing::debug;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::index::FlatIndex;
use crate::models::Chunk;

/// Embed `chunks` and build their index.
///
/// An empty chunk slice builds an empty index without calling the embedder.
///
/// # Errors
///
/// [`Error::EmbeddingFailure`] if the embedder errors, returns a row count
/// different from the chunk count, or returns rows of mixed or zero
/// dimensionality.
pub async fn build_index(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<FlatIndex> {
    if chunks.is_empty() {
        return FlatIndex::build(&[]);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder
        .embed(&texts)
        .await
        .map_err(|e| Error::EmbeddingFailure(format!("{:#}", e)))?;

    if vectors.len() != chunks.len() {
        return Err(Error::EmbeddingFailure(format!(
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let index = FlatIndex::build(&vectors)?;
    debug!(
        chunks = chunks.len(),
        dims = index.dims(),
        model = embedder.model_name(),
        "built flat index"
    );
    Ok(index)
}
