use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderValue;
use axum::{extract::{Path, State}, routing::{get, post}, Json, Router};
use pepsearch_core::persist::load_snapshot;
use pepsearch_core::{DocId, Document, EngineConfig, FileSource, IndexHandle, Ingestor, QueryEngine, RebuildSummary};
use serde::Deserialize;
use std::path::PathBuf;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;

pub use error::ApiError;

pub const DEFAULT_SIZE: usize = 10;
pub const MAX_SIZE: usize = 100;

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub search_text: Option<String>,
    /// Number of hits to return; the full ranking is computed either way.
    #[serde(default)]
    pub size: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    pub handle: IndexHandle,
    pub engine: QueryEngine,
    pub ingestor: Ingestor,
    /// Record file re-read by `/index/rebuild`.
    pub data_file: Option<PathBuf>,
}

/// Where the server gets its initial index from and how it is tuned.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub index_dir: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub config: EngineConfig,
}

impl AppState {
    pub fn new(handle: IndexHandle, config: &EngineConfig, data_file: Option<PathBuf>) -> Self {
        let engine = QueryEngine::new(handle.clone(), config.weights);
        let ingestor = Ingestor::new(handle.clone()).with_max_duration(config.max_rebuild_duration());
        Self { handle, engine, ingestor, data_file }
    }

    /// Load a saved snapshot if one is given, otherwise ingest the record file right away.
    pub fn load(opts: ServerOptions) -> Result<Self> {
        let handle = match &opts.index_dir {
            Some(dir) => IndexHandle::from_index(load_snapshot(dir)?.0),
            None => IndexHandle::new(),
        };
        let state = Self::new(handle, &opts.config, opts.data_file.clone());
        if opts.index_dir.is_none() {
            match &opts.data_file {
                Some(path) => {
                    let summary = state.ingestor.rebuild_from(&FileSource::open(path)?)?;
                    tracing::info!(path = %path.display(), indexed = summary.indexed, skipped = summary.skipped, "initial index built");
                }
                None => tracing::warn!("no --index or --data given; serving an empty index"),
            }
        }
        Ok(state)
    }
}

/// Origins listed in a comma-separated `CORS_ALLOW_ORIGIN` value. Entries that are not
/// valid header values are dropped.
pub fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).filter_map(|s| s.parse().ok()).collect()
}

fn cors_from_env() -> CorsLayer {
    let origins = std::env::var("CORS_ALLOW_ORIGIN").map(|raw| parse_origins(&raw)).unwrap_or_default();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any)
}

pub fn build_app(state: AppState) -> Router {
    let cors = cors_from_env();
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Relevance-ordered document bodies. A search that ranks nothing answers 404 with a
/// message body, distinct from the 400 given for missing text. A body that is not a
/// JSON object with a string `search_text` counts as missing text.
pub async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable search body");
        ApiError::BadRequest("search_text is required".into())
    })?;
    let text = req.search_text.unwrap_or_default();
    let size = req.size.unwrap_or(DEFAULT_SIZE).clamp(1, MAX_SIZE);
    let hits = state.engine.search_with_limit(&text, size)?;
    if hits.is_empty() {
        return Err(ApiError::NoResults);
    }
    Ok(Json(hits.into_iter().map(|h| h.document).collect()))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<Document>, ApiError> {
    let snapshot = state.handle.snapshot();
    let doc = snapshot.get_document(doc_id)?;
    Ok(Json(doc.clone()))
}

pub async fn rebuild_handler(State(state): State<AppState>) -> Result<Json<RebuildSummary>, ApiError> {
    let Some(path) = state.data_file.clone() else {
        return Err(ApiError::Unavailable("no record file configured".into()));
    };
    let ingestor = state.ingestor.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let source = FileSource::open(&path)?;
        ingestor.rebuild_from(&source)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(summary))
}
