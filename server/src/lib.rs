use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use search_core::{Engine, EngineConfig, QueryVector, Snapshot};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct ExplainParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub scheme: &'static str,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub scheme: &'static str,
    pub num_docs: usize,
    pub num_terms: usize,
    pub avgdl: Option<f64>,
}

#[derive(Serialize)]
pub struct ExplainResponse {
    pub query: String,
    pub terms: QueryVector,
}

pub struct AppOptions {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub admin_token: Option<String>,
}

/// Readers clone the inner `Arc` and drop the lock at once; a rebuild swaps
/// in a whole new snapshot.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
    data_dir: PathBuf,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    admin_token: Option<String>,
}

impl AppState {
    pub fn new(opts: AppOptions) -> Result<Self> {
        let engine = Engine::new(&opts.config)?;
        let snapshot = engine.fit_dir(&opts.data_dir)?;
        Ok(Self {
            engine: Arc::new(engine),
            data_dir: opts.data_dir,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
            admin_token: opts.admin_token,
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }
}

pub fn build_app(opts: AppOptions) -> Result<Router> {
    let app_state = AppState::new(opts)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/explain", get(explain_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let snapshot = state.snapshot();
    let ranking = snapshot.search(&params.q);
    let k = params.k.clamp(1, 100);
    let results = ranking
        .top(k)
        .iter()
        .map(|h| SearchHit { doc_id: h.doc_id.clone(), score: h.score })
        .collect();
    let elapsed = start.elapsed();
    Json(SearchResponse {
        query: params.q,
        scheme: snapshot.scheme().name(),
        took_s: elapsed.as_secs_f64(),
        total_hits: ranking.len(),
        results,
    })
}

pub async fn explain_handler(State(state): State<AppState>, Query(params): Query<ExplainParams>) -> Json<ExplainResponse> {
    let terms = state.snapshot().query_vector(&params.q);
    Json(ExplainResponse { query: params.q, terms })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.snapshot();
    Json(StatsResponse {
        scheme: snapshot.scheme().name(),
        num_docs: snapshot.stats().num_docs(),
        num_terms: snapshot.index().num_terms(),
        avgdl: snapshot.stats().avgdl().ok(),
    })
}

async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let engine = Arc::clone(&state.engine);
    let dir = state.data_dir.clone();
    let snapshot = tokio::task::spawn_blocking(move || engine.fit_dir(dir))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(error_response)?;
    tracing::info!(num_docs = snapshot.stats().num_docs(), "swapped in rebuilt snapshot");
    state.replace(snapshot);
    Ok(stats_handler(State(state)).await)
}

fn error_response(err: search_core::Error) -> (StatusCode, String) {
    use search_core::Error;
    let status = match err {
        Error::InvalidWeightingConfig(_) | Error::InvalidStopPattern(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
