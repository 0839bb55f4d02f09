//! # passage-index core
//!
//! Shared logic for passage-index: data models, sliding-window chunking,
//! the flat L2 vector index, per-document index construction, the typed
//! index registry, and the multi-index search algorithm.
//!
//! This crate performs no filesystem or network I/O. Embedding is reached
//! through the [`embedding::Embedder`] trait, which the application crate
//! implements for its concrete providers.

pub mod builder;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod registry;
pub mod search;

pub use error::{Error, Result};
