//! Multi-index nearest-chunk search.
//!
//! The search algorithm runs over an [`IndexRegistry`] and an [`Embedder`]
//! bundled in a [`SearchContext`], with no configuration or I/O of its own.
//!
//! # Algorithm
//!
//! 1. Validate the request (non-blank query, `top_k > 0`).
//! 2. Embed the query once.
//! 3. Probe every document index (or only the filtered one) for its local
//!    `top_k` nearest neighbors.
//! 4. Map each neighbor position to the chunk with the same id; positions
//!    with no chunk are dropped and counted.
//! 5. Score: `similarity = 1 / (1 + distance)`.
//! 6. Stable sort all candidates by distance (ascending) and truncate to
//!    `top_k`.
//!
//! Distances from different documents are compared as-is, without
//! per-document normalization.

use tracing::{debug, warn};

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::models::SearchResult;
use crate::registry::IndexRegistry;

/// Inputs for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,
    /// Maximum results to return; also the per-document probe depth.
    pub top_k: usize,
    /// Only probe the document with this key.
    pub document_filter: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            document_filter: None,
        }
    }

    pub fn with_document(mut self, key: impl Into<String>) -> Self {
        self.document_filter = Some(key.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Ranked results plus bookkeeping about how they were produced.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// Documents whose index was probed.
    pub documents_probed: usize,
    /// Candidates whose index position had no matching chunk.
    pub desync_dropped: usize,
}

/// Immutable state shared by every query: the loaded indexes and the
/// embedder used to vectorize queries.
pub struct SearchContext {
    registry: IndexRegistry,
    embedder: Box<dyn Embedder>,
}

impl SearchContext {
    pub fn new(registry: IndexRegistry, embedder: Box<dyn Embedder>) -> Self {
        Self { registry, embedder }
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Run [`search`] against this context.
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchOutcome> {
        search(&self.registry, self.embedder.as_ref(), req).await
    }
}

/// Convert a raw L2 distance into a similarity in `(0, 1]`.
pub fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Search every document in `registry` for the chunks nearest to the query.
///
/// An empty registry, or a filter naming no loaded document, yields an
/// empty result list.
///
/// # Errors
///
/// - [`Error::InvalidQuery`] for a blank query or `top_k == 0`.
/// - [`Error::EmbeddingFailure`] if embedding the query fails or its
///   dimension does not match a probed index.
pub async fn search(
    registry: &IndexRegistry,
    embedder: &dyn Embedder,
    req: &SearchRequest,
) -> Result<SearchOutcome> {
    req.validate()?;

    if registry.is_empty() {
        return Ok(SearchOutcome::default());
    }

    let query_vec = embed_query(embedder, &req.query).await?;

    let mut outcome = SearchOutcome::default();
    let mut candidates: Vec<SearchResult> = Vec::new();

    let targets = registry
        .iter()
        .filter(|entry| match req.document_filter.as_deref() {
            Some(key) => entry.key == key,
            None => true,
        });

    for entry in targets {
        let neighbors = entry.index.search(&query_vec, req.top_k)?;
        outcome.documents_probed += 1;
        debug!(document = %entry.key, hits = neighbors.len(), "probed index");

        for n in neighbors {
            let Some(chunk) = entry.chunks.get(n.position) else {
                outcome.desync_dropped += 1;
                continue;
            };
            candidates.push(SearchResult {
                source_file: chunk.source_file.clone(),
                chunk_id: chunk.chunk_id,
                text: chunk.text.clone(),
                score: n.distance,
                similarity: similarity(n.distance),
            });
        }
    }

    if outcome.desync_dropped > 0 {
        warn!(
            dropped = outcome.desync_dropped,
            "dropped candidates with no matching chunk"
        );
    }

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    candidates.truncate(req.top_k);
    outcome.results = candidates;

    Ok(outcome)
}

async fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>> {
    let rows = embedder
        .embed(&[query.to_string()])
        .await
        .map_err(|e| Error::EmbeddingFailure(format!("{:#}", e)))?;

    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(v), None) => Ok(v),
        (None, _) => Err(Error::EmbeddingFailure(
            "empty embedding response for query".to_string(),
        )),
        (Some(_), Some(_)) => Err(Error::EmbeddingFailure(
            "embedder returned more than one vector for the query".to_string(),
        )),
    }
}
