//! On-disk layout of chunk files and index artifacts.
//!
//! A document with key `K` (the source file's stem) owns two files:
//!
//! | File | Contents |
//! |------|----------|
//! | `<processed_dir>/K_chunks.json` | [`ChunkFile`] as pretty JSON |
//! | `<index_dir>/K_index.flat` | [`FlatIndex`] artifact bytes |
//!
//! [`load_registry`] pairs the two halves of every document and assembles an
//! [`IndexRegistry`]. Documents that cannot be paired or decoded are skipped
//! and reported in the [`LoadReport`].

use anyhow::{Context, Result};
use passage_index_core::index::FlatIndex;
use passage_index_core::models::ChunkFile;
use passage_index_core::registry::{DocumentEntry, IndexRegistry, LoadReport};
use passage_index_core::Error;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::PathsConfig;

pub const CHUNKS_SUFFIX: &str = "_chunks.json";
pub const INDEX_SUFFIX: &str = "_index.flat";

/// Document key for a source file: its file name without the extension.
pub fn document_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn chunks_path(processed_dir: &Path, key: &str) -> PathBuf {
    processed_dir.join(format!("{key}{CHUNKS_SUFFIX}"))
}

pub fn index_path(index_dir: &Path, key: &str) -> PathBuf {
    index_dir.join(format!("{key}{INDEX_SUFFIX}"))
}

pub fn write_chunk_file(processed_dir: &Path, key: &str, file: &ChunkFile) -> Result<PathBuf> {
    std::fs::create_dir_all(processed_dir)
        .with_context(|| format!("Failed to create {}", processed_dir.display()))?;
    let path = chunks_path(processed_dir, key);
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn read_chunk_file(path: &Path) -> Result<ChunkFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid chunk file {}", path.display()))
}

pub fn write_index(index_dir: &Path, key: &str, index: &FlatIndex) -> Result<PathBuf> {
    std::fs::create_dir_all(index_dir)
        .with_context(|| format!("Failed to create {}", index_dir.display()))?;
    let path = index_path(index_dir, key);
    std::fs::write(&path, index.to_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Delete the index artifact for `key`, if one exists.
pub fn remove_index(index_dir: &Path, key: &str) -> Result<()> {
    let path = index_path(index_dir, key);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

pub fn read_index(path: &Path, key: &str) -> Result<FlatIndex> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(FlatIndex::from_bytes(key, &bytes)?)
}

/// Keys of every file in `dir` whose name ends with `suffix`.
///
/// A missing directory has no keys.
pub fn keys_with_suffix(dir: &Path, suffix: &str) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    if !dir.exists() {
        return Ok(keys);
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(key) = name.strip_suffix(suffix) {
            if !key.is_empty() {
                keys.insert(key.to_string());
            }
        }
    }
    Ok(keys)
}

/// Load every document that has both a chunk file and an index artifact.
///
/// Only an unreadable directory fails the whole load; everything
/// per-document lands in the returned [`LoadReport`].
pub fn load_registry(paths: &PathsConfig) -> Result<(IndexRegistry, LoadReport)> {
    let chunk_keys = keys_with_suffix(&paths.processed_dir, CHUNKS_SUFFIX)?;
    let index_keys = keys_with_suffix(&paths.index_dir, INDEX_SUFFIX)?;

    let mut registry = IndexRegistry::new();
    let mut report = LoadReport::default();

    for key in chunk_keys.union(&index_keys) {
        let outcome = load_document(paths, key, &chunk_keys, &index_keys);
        if let Err(e) = &outcome {
            warn!(key = %key, error = %e, "skipping document index");
        }
        report.record(&mut registry, key, outcome);
    }

    info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        "loaded document indexes"
    );
    Ok((registry, report))
}

fn load_document(
    paths: &PathsConfig,
    key: &str,
    chunk_keys: &BTreeSet<String>,
    index_keys: &BTreeSet<String>,
) -> passage_index_core::Result<DocumentEntry> {
    let failure = |reason: String| Error::IndexLoadFailure {
        key: key.to_string(),
        reason,
    };

    if !chunk_keys.contains(key) {
        return Err(failure(format!("missing chunk file {key}{CHUNKS_SUFFIX}")));
    }
    if !index_keys.contains(key) {
        return Err(failure(format!("missing index artifact {key}{INDEX_SUFFIX}")));
    }

    let chunk_file = read_chunk_file(&chunks_path(&paths.processed_dir, key))
        .map_err(|e| failure(format!("{:#}", e)))?;
    let index = match read_index(&index_path(&paths.index_dir, key), key) {
        Ok(index) => index,
        Err(e) => match e.downcast::<Error>() {
            Ok(core) => return Err(core),
            Err(other) => return Err(failure(format!("{:#}", other))),
        },
    };

    if chunk_file.total_chunks != chunk_file.chunks.len() {
        return Err(failure(format!(
            "chunk file declares {} chunks but lists {}",
            chunk_file.total_chunks,
            chunk_file.chunks.len()
        )));
    }

    let entry = DocumentEntry::new(key, chunk_file.file_name, chunk_file.chunks, index);
    entry.check_alignment()?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_index_core::chunk::window_text;

    fn paths(root: &Path) -> PathsConfig {
        PathsConfig {
            raw_dir: root.join("raw"),
            processed_dir: root.join("processed"),
            index_dir: root.join("embeddings"),
            include_globs: vec!["**/*.txt".to_string()],
        }
    }

    fn store_document(paths: &PathsConfig, key: &str, text: &str) {
        let chunks = window_text(text, &format!("{key}.txt"), 2, 1).unwrap();
        let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| vec![c.position as f32, 1.0]).collect();
        write_chunk_file(&paths.processed_dir, key, &ChunkFile::new(format!("{key}.txt"), chunks))
            .unwrap();
        write_index(&paths.index_dir, key, &FlatIndex::build(&vectors).unwrap()).unwrap();
    }

    #[test]
    fn test_document_key_is_stem() {
        assert_eq!(document_key(Path::new("raw/notes.v2.txt")), "notes.v2");
        assert_eq!(document_key(Path::new("README")), "README");
    }

    #[test]
    fn test_chunk_file_roundtrip_on_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let chunks = window_text("a b c", "doc.txt", 2, 1).unwrap();
        let file = ChunkFile::new("doc.txt", chunks);
        let path = write_chunk_file(tmp.path(), "doc", &file).unwrap();
        assert!(path.ends_with("doc_chunks.json"));
        assert_eq!(read_chunk_file(&path).unwrap(), file);
    }

    #[test]
    fn test_load_pairs_documents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(tmp.path());
        store_document(&paths, "alpha", "one two three");
        store_document(&paths, "beta", "four five");

        let (registry, report) = load_registry(&paths).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(report.loaded, vec!["alpha".to_string(), "beta".to_string()]);
        assert!(!report.is_degraded());
        assert_eq!(registry.get("alpha").unwrap().file_name, "alpha.txt");
    }

    #[test]
    fn test_missing_partner_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(tmp.path());
        store_document(&paths, "alpha", "one two three");
        store_document(&paths, "beta", "four five");
        std::fs::remove_file(index_path(&paths.index_dir, "beta")).unwrap();

        let (registry, report) = load_registry(&paths).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "beta");
        assert!(report.failed[0].reason.contains("missing index artifact"));
    }

    #[test]
    fn test_count_mismatch_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(tmp.path());
        store_document(&paths, "alpha", "one two three four five");
        let short = FlatIndex::build(&[vec![0.0, 1.0]]).unwrap();
        write_index(&paths.index_dir, "alpha", &short).unwrap();

        let (registry, report) = load_registry(&paths).unwrap();
        assert!(registry.is_empty());
        assert!(report.failed[0].reason.contains("vectors"));
    }

    #[test]
    fn test_corrupt_artifact_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths(tmp.path());
        store_document(&paths, "alpha", "one two three");
        std::fs::write(index_path(&paths.index_dir, "alpha"), b"garbage").unwrap();

        let (registry, report) = load_registry(&paths).unwrap();
        assert!(registry.is_empty());
        assert_eq!(report.failed[0].reason, "not a flat index artifact");
    }

    #[test]
    fn test_missing_directories_load_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (registry, report) = load_registry(&paths(tmp.path())).unwrap();
        assert!(registry.is_empty());
        assert!(report.loaded.is_empty() && report.failed.is_empty());
    }
}
