//! HTTP query server.
//!
//! Loads every document index once at startup into an immutable
//! [`SearchContext`] shared by all handlers through `Arc`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Ranked chunks for `{ "query", "top_k"?, "document"? }` |
//! | `GET`  | `/documents` | Loaded documents and load failures |
//! | `GET`  | `/health` | Health check (version, document count) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid query: query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `embedding_failed` (502), `internal` (500).

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use passage_index_core::embedding::Embedder;
use passage_index_core::models::SearchResult;
use passage_index_core::registry::{LoadFailure, LoadReport};
use passage_index_core::search::{SearchContext, SearchRequest};
use passage_index_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::store;

/// State shared by every handler.
pub struct ServerState {
    pub context: SearchContext,
    /// Load outcome, reported by `GET /documents`.
    pub report: LoadReport,
    /// `top_k` used when a request omits it.
    pub default_top_k: usize,
}

/// Load indexes, build the embedder from config, and serve on `[server] bind`.
///
/// Refuses to start when no document index could be loaded.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let embedder = create_embedder(&config.embedding)?;
    let state = load_state(config, embedder)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    println!("server listening on http://{}", listener.local_addr()?);

    serve(listener, state, &config.server.cors_origins).await
}

/// Assemble [`ServerState`] from the stored indexes.
///
/// # Errors
///
/// [`Error::NoIndexesAvailable`] (wrapped) when the registry is empty.
pub fn load_state(config: &Config, embedder: Box<dyn Embedder>) -> anyhow::Result<Arc<ServerState>> {
    let (registry, report) = store::load_registry(&config.paths)?;
    registry.ensure_available()?;
    info!(
        documents = registry.len(),
        model = embedder.model_name(),
        "search context ready"
    );

    Ok(Arc::new(ServerState {
        context: SearchContext::new(registry, embedder),
        report,
        default_top_k: config.retrieval.top_k,
    }))
}

/// Serve on an already-bound listener until the process exits.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: Arc<ServerState>,
    cors_origins: &[String],
) -> anyhow::Result<()> {
    let app = router(state, cors_origins)?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>, cors_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/search", post(handle_search))
        .route("/documents", get(handle_documents))
        .route("/health", get(handle_health))
        .layer(cors_layer(cors_origins)?)
        .with_state(state))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let values = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(values)))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::InvalidQuery(_) => bad_request(message),
            Error::EmbeddingFailure(_) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "embedding_failed",
                message,
            },
            _ => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message,
            },
        }
    }
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchBody {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
    /// Restrict to one document key.
    #[serde(default)]
    document: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

async fn handle_search(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(body) = payload.map_err(|e| bad_request(e.body_text()))?;

    let mut request = SearchRequest::new(body.query, body.top_k.unwrap_or(state.default_top_k));
    if let Some(key) = body.document {
        request = request.with_document(key);
    }

    let outcome = state.context.search(&request).await?;
    Ok(Json(SearchResponse {
        results: outcome.results,
    }))
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentInfo {
    key: String,
    file_name: String,
    chunks: usize,
}

#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentInfo>,
    failed: Vec<LoadFailure>,
}

async fn handle_documents(State(state): State<Arc<ServerState>>) -> Json<DocumentsResponse> {
    let documents = state
        .context
        .registry()
        .iter()
        .map(|entry| DocumentInfo {
            key: entry.key.clone(),
            file_name: entry.file_name.clone(),
            chunks: entry.chunks.len(),
        })
        .collect();

    Json(DocumentsResponse {
        documents,
        failed: state.report.failed.clone(),
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
}

async fn handle_health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.context.registry().len(),
    })
}
