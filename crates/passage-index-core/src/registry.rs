//! Typed registry of loaded per-document indexes.
//!
//! The registry maps a document key to the document's chunks and its
//! [`FlatIndex`]. It is assembled once at load time and only read
//! afterward, so it can be shared across query threads without locking.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::FlatIndex;
use crate::models::Chunk;

/// Everything the query engine needs for one document.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub key: String,
    pub file_name: String,
    pub chunks: Vec<Chunk>,
    pub index: FlatIndex,
}

impl DocumentEntry {
    pub fn new(
        key: impl Into<String>,
        file_name: impl Into<String>,
        chunks: Vec<Chunk>,
        index: FlatIndex,
    ) -> Self {
        Self {
            key: key.into(),
            file_name: file_name.into(),
            chunks,
            index,
        }
    }

    /// Verify index position `i` can be read as chunk `i`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexLoadFailure`] when the index and chunk counts differ or
    /// chunk ids are not `0..n` in order.
    pub fn check_alignment(&self) -> Result<()> {
        if self.index.len() != self.chunks.len() {
            return Err(Error::load(
                &self.key,
                format!(
                    "index holds {} vectors but metadata lists {} chunks",
                    self.index.len(),
                    self.chunks.len()
                ),
            ));
        }
        if let Some((i, c)) = self
            .chunks
            .iter()
            .enumerate()
            .find(|(i, c)| c.chunk_id != *i)
        {
            return Err(Error::load(
                &self.key,
                format!("chunk at position {} has chunk_id {}", i, c.chunk_id),
            ));
        }
        Ok(())
    }
}

/// Read-only mapping from document key to [`DocumentEntry`], ordered by key.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    entries: BTreeMap<String, DocumentEntry>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous entry with the same key.
    pub fn insert(&mut self, entry: DocumentEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&DocumentEntry> {
        self.entries.get(key)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail with [`Error::NoIndexesAvailable`] when nothing was loaded.
    pub fn ensure_available(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::NoIndexesAvailable(
                "no document index could be loaded; run `pidx build` first".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromIterator<DocumentEntry> for IndexRegistry {
    fn from_iter<I: IntoIterator<Item = DocumentEntry>>(iter: I) -> Self {
        let mut registry = IndexRegistry::new();
        for entry in iter {
            registry.insert(entry);
        }
        registry
    }
}

/// A document that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub key: String,
    pub reason: String,
}

/// Per-document outcome of assembling a registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<LoadFailure>,
}

impl LoadReport {
    /// Record the outcome for document `key`, inserting it on success.
    pub fn record(
        &mut self,
        registry: &mut IndexRegistry,
        key: &str,
        outcome: Result<DocumentEntry>,
    ) {
        match outcome {
            Ok(entry) => {
                self.loaded.push(entry.key.clone());
                registry.insert(entry);
            }
            Err(Error::IndexLoadFailure { reason, .. }) => {
                self.failed.push(LoadFailure {
                    key: key.to_string(),
                    reason,
                });
            }
            Err(other) => {
                self.failed.push(LoadFailure {
                    key: key.to_string(),
                    reason: other.to_string(),
                });
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::window_text;

    fn entry(key: &str, tokens: &str) -> DocumentEntry {
        let chunks = window_text(tokens, &format!("{key}.txt"), 2, 1).unwrap();
        let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| vec![c.position as f32]).collect();
        let index = FlatIndex::build(&vectors).unwrap();
        DocumentEntry::new(key, format!("{key}.txt"), chunks, index)
    }

    #[test]
    fn test_iteration_ordered_by_key() {
        let registry: IndexRegistry = vec![entry("b", "x y z"), entry("a", "x y")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_registry_not_available() {
        let err = IndexRegistry::new().ensure_available().unwrap_err();
        assert!(matches!(err, Error::NoIndexesAvailable(_)));
    }

    #[test]
    fn test_alignment_ok() {
        assert!(entry("a", "one two three four").check_alignment().is_ok());
    }

    #[test]
    fn test_alignment_count_mismatch() {
        let mut e = entry("a", "one two three four");
        e.chunks.pop();
        let err = e.check_alignment().unwrap_err();
        assert!(matches!(err, Error::IndexLoadFailure { .. }));
    }

    #[test]
    fn test_alignment_ids_out_of_order() {
        let mut e = entry("a", "one two three four");
        e.chunks.swap(0, 1);
        assert!(e.check_alignment().is_err());
    }

    #[test]
    fn test_report_records_outcomes() {
        let mut registry = IndexRegistry::new();
        let mut report = LoadReport::default();
        report.record(&mut registry, "a", Ok(entry("a", "x y")));
        report.record(&mut registry, "b", Err(Error::load("b", "missing index")));

        assert_eq!(report.loaded, vec!["a".to_string()]);
        assert_eq!(
            report.failed,
            vec![LoadFailure {
                key: "b".to_string(),
                reason: "missing index".to_string()
            }]
        );
        assert!(report.is_degraded());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_some());
    }
}
