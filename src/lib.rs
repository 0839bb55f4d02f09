//! # Passage Index
//!
//! Split plain-text documents into overlapping token windows, embed each
//! window, keep one flat vector index per document, and answer queries by
//! probing every index and merging the nearest chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ raw_dir  │──▶│ chunk stage  │──▶│ *_chunks.json   │
//! │  *.txt   │   │ (windowing)  │   │ (processed_dir) │
//! └──────────┘   └──────────────┘   └───────┬─────────┘
//!                                           ▼
//!                ┌──────────────┐   ┌─────────────────┐
//!                │ embed stage  │──▶│ *_index.flat    │
//!                │ (providers)  │   │ (index_dir)     │
//!                └──────────────┘   └───────┬─────────┘
//!                                           ▼
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                 ┌──────────┐        ┌──────────┐
//!                 │   CLI    │        │   HTTP   │
//!                 │  (pidx)  │        │ /search  │
//!                 └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pidx build                       # chunk + embed everything in raw_dir
//! pidx search "termination clause" --top-k 5
//! pidx documents                   # what the query side can load
//! pidx serve                       # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers |
//! | [`store`] | Chunk file and index artifact layout, registry loading |
//! | [`ingest`] | Chunk and embed build stages |
//! | [`search`] | Command-line search |
//! | [`documents`] | Document listing |
//! | [`server`] | HTTP server |
//!
//! Windowing, the flat index, and the search algorithm live in
//! `passage-index-core`.

pub mod config;
pub mod documents;
pub mod embedding;
pub mod ingest;
pub mod search;
pub mod server;
pub mod store;
