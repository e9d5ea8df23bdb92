//! HTTP surface: `GET /recommend`, `GET /api/recommend` and `GET /health`.
//!
//! Query validation happens before the engine is touched, so a bad request
//! never triggers a cold start.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use data_loader::{ItemId, UserId};

use crate::engine::Strategy;
use crate::error::EngineError;
use crate::loader::EngineCell;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineCell>,
    pub max_k: usize,
}

impl AppState {
    pub fn new(engine: Arc<EngineCell>, max_k: usize) -> Self {
        Self {
            engine,
            max_k: max_k.max(1),
        }
    }
}

/// Build the router with CORS open to any origin and request tracing
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/recommend", get(handle_recommend))
        .route("/api/recommend", get(handle_recommend))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `bind_addr` and serve until Ctrl-C
pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Recommendation server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Handler error that renders as a JSON error body
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
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

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "engine_unavailable",
                message: format!("Engine load failed: {}", msg),
            },
            EngineError::Computation(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "recommend_failed",
                message: format!("Recommend failed: {}", msg),
            },
        }
    }
}

// ============ GET /recommend ============

#[derive(Debug, Serialize)]
struct RecommendResponse {
    user_id: UserId,
    recommended_articles: Vec<ItemId>,
    strategy: Strategy,
}

/// Validated query parameters
#[derive(Debug, PartialEq)]
struct RecommendQuery {
    user_id: UserId,
    /// `None` means "use the bundle's top_k"
    k: Option<usize>,
}

impl RecommendQuery {
    fn parse(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let raw_user = params
            .get("user_id")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| bad_request("Missing query parameter 'user_id'"))?;

        let user_id: UserId = raw_user
            .parse()
            .map_err(|_| bad_request("'user_id' must be an integer"))?;

        let k = match params.get("k") {
            Some(raw) => parse_k(raw)?,
            None => None,
        };

        Ok(Self { user_id, k })
    }
}

/// Non-integer k falls back to the default; integer k must be positive.
///
/// Integers too large for `usize` saturate, so they are clamped like any
/// other large k.
fn parse_k(raw: &str) -> Result<Option<usize>, AppError> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    if negative || digits.bytes().all(|b| b == b'0') {
        return Err(bad_request("'k' must be a positive integer"));
    }
    Ok(Some(digits.parse::<usize>().unwrap_or(usize::MAX)))
}

async fn handle_recommend(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RecommendResponse>, AppError> {
    let query = RecommendQuery::parse(&params)?;

    let engine = state.engine.get().await?;
    let k = query.k.unwrap_or_else(|| engine.top_k()).min(state.max_k);

    let recommendation = tokio::task::spawn_blocking(move || engine.recommend(query.user_id, k))
        .await
        .map_err(|e| AppError::from(EngineError::Computation(e.to_string())))??;

    Ok(Json(RecommendResponse {
        user_id: recommendation.user_id,
        recommended_articles: recommendation.item_ids(),
        strategy: recommendation.strategy,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    engine_loaded: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        engine_loaded: state.engine.is_loaded(),
    })
}
