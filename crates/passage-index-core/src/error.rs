//! Error taxonomy for the build and query pipelines.

use thiserror::Error;

/// Errors produced by the core pipeline.
///
/// Build-time variants are scoped to a single document: callers record them
/// per document and keep going. [`Error::NoIndexesAvailable`] is the only
/// variant that is fatal for a whole run.
#[derive(Error, Debug)]
pub enum Error {
    /// Windowing parameters that cannot terminate or produce sensible chunks.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedder failed, or returned rows that do not line up with the input.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// A stored index or its paired chunk metadata is missing, unreadable, or mismatched.
    #[error("index load failed for '{key}': {reason}")]
    IndexLoadFailure { key: String, reason: String },

    /// Every document failed to load, so there is nothing to search.
    #[error("no indexes available: {0}")]
    NoIndexesAvailable(String),

    /// A malformed query request (blank query, non-positive `top_k`).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl Error {
    pub(crate) fn load(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::IndexLoadFailure {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
