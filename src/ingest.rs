//! Build pipelines: raw text → chunk files → index artifacts.
//!
//! | Stage | Reads | Writes |
//! |-------|-------|--------|
//! | [`run_chunk`] | `raw_dir` files matching `include_globs` | `<key>_chunks.json` |
//! | [`run_embed`] | `<key>_chunks.json` | `<key>_index.flat` |
//!
//! Documents are processed independently. A failing document is recorded
//! in the stage's [`BuildReport`] and the batch moves on; only a stage that
//! cannot start (missing input directory, bad glob) returns an error.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use passage_index_core::builder::build_index;
use passage_index_core::chunk::{window, WindowParams};
use passage_index_core::embedding::Embedder;
use passage_index_core::models::ChunkFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::store;

/// Per-document outcome of one build stage.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub stage: &'static str,
    pub succeeded: Vec<String>,
    /// Documents with zero chunks; nothing to index.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Chunks written (chunk stage) or embedded (embed stage).
    pub chunks: usize,
}

impl BuildReport {
    fn new(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn documents(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    fn fail(&mut self, key: &str, reason: String) {
        warn!(stage = self.stage, key = %key, error = %reason, "document failed");
        self.failed.push((key.to_string(), reason));
    }

    /// Print the stage summary to stdout.
    pub fn print(&self) {
        println!("{}", self.stage);
        println!("  documents: {}", self.documents());
        println!("  succeeded: {}", self.succeeded.len());
        if !self.skipped.is_empty() {
            println!("  skipped (no chunks): {}", self.skipped.len());
        }
        println!("  chunks: {}", self.chunks);
        println!("  failed: {}", self.failed.len());
        for (key, reason) in &self.failed {
            println!("    {}: {}", key, reason);
        }
        println!("ok");
    }
}

/// Source files under `raw_dir` matching the include globs, sorted by path.
pub fn scan_raw_documents(config: &Config) -> Result<Vec<PathBuf>> {
    let root = &config.paths.raw_dir;
    if !root.exists() {
        bail!("Raw document directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.paths.include_globs)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if include_set.is_match(relative) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// Window every raw document and write its chunk file.
///
/// Rewriting a chunk file deletes the document's index artifact. Two files
/// with the same stem map to one key; the first in path order wins and the
/// rest are recorded as failures.
pub fn run_chunk(config: &Config) -> Result<BuildReport> {
    let files = scan_raw_documents(config)?;
    let params = WindowParams::new(config.chunking.chunk_size, config.chunking.overlap);
    let mut report = BuildReport::new("chunk");

    info!(documents = files.len(), "chunking raw documents");

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for path in &files {
        let key = store::document_key(path);
        if let Some(first) = seen.get(&key) {
            report.fail(
                &key,
                format!(
                    "duplicate document key: {} already produced by {}",
                    path.display(),
                    first.display()
                ),
            );
            continue;
        }
        seen.insert(key.clone(), path.clone());
        let params = match &params {
            Ok(p) => *p,
            Err(e) => {
                report.fail(&key, e.to_string());
                continue;
            }
        };
        match chunk_document(config, path, &key, params) {
            Ok(count) => {
                info!(key = %key, chunks = count, "chunked document");
                report.chunks += count;
                report.succeeded.push(key);
            }
            Err(e) => report.fail(&key, format!("{:#}", e)),
        }
    }

    Ok(report)
}

fn chunk_document(config: &Config, path: &Path, key: &str, params: WindowParams) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| key.to_string());

    let chunks = window(&text, &file_name, params);
    let count = chunks.len();
    // The old vectors describe the old chunks.
    store::remove_index(&config.paths.index_dir, key)?;
    store::write_chunk_file(
        &config.paths.processed_dir,
        key,
        &ChunkFile::new(file_name, chunks),
    )?;
    Ok(count)
}

/// Embed every chunk file and write its index artifact.
///
/// Documents with zero chunks are skipped. A skipped or failed document
/// loses any index left from an earlier build.
pub async fn run_embed(config: &Config, embedder: &dyn Embedder) -> Result<BuildReport> {
    let processed_dir = &config.paths.processed_dir;
    if !processed_dir.exists() {
        bail!(
            "Processed directory does not exist: {} (run `pidx chunk` first)",
            processed_dir.display()
        );
    }

    let keys = store::keys_with_suffix(processed_dir, store::CHUNKS_SUFFIX)?;
    let mut report = BuildReport::new("embed");

    info!(
        documents = keys.len(),
        model = embedder.model_name(),
        "embedding chunk files"
    );

    for key in &keys {
        let chunk_file = match store::read_chunk_file(&store::chunks_path(processed_dir, key)) {
            Ok(f) => f,
            Err(e) => {
                report.fail(key, format!("{:#}", e));
                continue;
            }
        };

        if chunk_file.chunks.is_empty() {
            info!(key = %key, "no chunks; skipping");
            if let Err(e) = store::remove_index(&config.paths.index_dir, key) {
                warn!(key = %key, error = %format!("{:#}", e), "failed to remove stale index");
            }
            report.skipped.push(key.clone());
            continue;
        }

        let index = match build_index(&chunk_file.chunks, embedder).await {
            Ok(index) => index,
            Err(e) => {
                report.fail(key, e.to_string());
                if let Err(e) = store::remove_index(&config.paths.index_dir, key) {
                    warn!(key = %key, error = %format!("{:#}", e), "failed to remove stale index");
                }
                continue;
            }
        };

        match store::write_index(&config.paths.index_dir, key, &index) {
            Ok(_) => {
                info!(key = %key, vectors = index.len(), dims = index.dims(), "wrote index");
                report.chunks += index.len();
                report.succeeded.push(key.clone());
            }
            Err(e) => report.fail(key, format!("{:#}", e)),
        }
    }

    Ok(report)
}

/// Run the chunk stage, then the embed stage.
pub async fn run_build(config: &Config, embedder: &dyn Embedder) -> Result<(BuildReport, BuildReport)> {
    let chunked = run_chunk(config)?;
    let embedded = run_embed(config, embedder).await?;
    Ok((chunked, embedded))
}
