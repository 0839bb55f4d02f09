//! # Passage Index CLI (`pidx`)
//!
//! ## Usage
//!
//! ```bash
//! pidx --config ./config/pidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pidx chunk` | Window every raw document into a chunk file |
//! | `pidx embed` | Embed every chunk file into an index artifact |
//! | `pidx build` | `chunk` then `embed` |
//! | `pidx search "<query>"` | Search all document indexes |
//! | `pidx documents` | List loadable documents and load failures |
//! | `pidx serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use passage_index::{config, documents, embedding, ingest, search, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Passage Index: chunk documents, index them per document, and search
/// across all of them.
#[derive(Parser)]
#[command(
    name = "pidx",
    about = "Sliding-window chunking, per-document vector indexes, and multi-index search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pidx.toml")]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Window every file in `raw_dir` and write `<key>_chunks.json`.
    Chunk,

    /// Embed every chunk file and write `<key>_index.flat`.
    Embed,

    /// Run `chunk` and then `embed`.
    Build,

    /// Search all loaded document indexes.
    Search {
        /// Query text.
        query: String,

        /// Maximum number of results (defaults to `[retrieval] top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Only search the document with this key.
        #[arg(long)]
        document: Option<String>,
    },

    /// List documents the query side can load.
    Documents,

    /// Start the HTTP server.
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunk => {
            ingest::run_chunk(&cfg)?.print();
        }
        Commands::Embed => {
            let embedder = embedding::create_embedder(&cfg.embedding)?;
            ingest::run_embed(&cfg, embedder.as_ref()).await?.print();
        }
        Commands::Build => {
            let embedder = embedding::create_embedder(&cfg.embedding)?;
            let (chunked, embedded) = ingest::run_build(&cfg, embedder.as_ref()).await?;
            chunked.print();
            embedded.print();
        }
        Commands::Search {
            query,
            top_k,
            document,
        } => {
            let embedder = embedding::create_embedder(&cfg.embedding)?;
            search::run_search(&cfg, embedder.as_ref(), &query, top_k, document).await?;
        }
        Commands::Documents => {
            documents::list_documents(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
