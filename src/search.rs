//! `pidx search`: query the stored indexes from the command line.

use anyhow::Result;
use passage_index_core::embedding::Embedder;
use passage_index_core::models::SearchResult;
use passage_index_core::search::{search, SearchRequest};
use tracing::warn;

use crate::config::Config;
use crate::store;

const EXCERPT_CHARS: usize = 240;

/// Load the registry, run one query, and print the ranked results.
///
/// `top_k` falls back to `[retrieval] top_k`; `document` restricts the
/// search to one document key.
pub async fn run_search(
    config: &Config,
    embedder: &dyn Embedder,
    query: &str,
    top_k: Option<usize>,
    document: Option<String>,
) -> Result<()> {
    let (registry, report) = store::load_registry(&config.paths)?;
    if report.is_degraded() {
        warn!(failed = report.failed.len(), "some document indexes were skipped");
    }

    let mut request = SearchRequest::new(query, top_k.unwrap_or(config.retrieval.top_k));
    if let Some(key) = document {
        request = request.with_document(key);
    }

    let outcome = search(&registry, embedder, &request).await?;

    if outcome.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print_results(&outcome.results);
    if outcome.desync_dropped > 0 {
        println!("({} candidates dropped: index and chunk metadata out of sync)", outcome.desync_dropped);
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} #{}",
            i + 1,
            result.similarity,
            result.source_file,
            result.chunk_id
        );
        println!("    distance: {:.4}", result.score);
        println!("    excerpt: \"{}\"", excerpt(&result.text, EXCERPT_CHARS));
        println!();
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
