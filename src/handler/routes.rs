//! Route definitions for the turtle query surface
//!
//! - GET /turtles - Fleet listing, filterable by `include_offline`
//! - GET /turtles/:turtle_id - Full detail for one turtle
//! - GET /health - Health check endpoint
//! - GET /metrics - Prometheus text exposition

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::{ApiResponse, ErrorInfo};
use crate::error::StatusError;
use crate::query::{QueryService, TurtleDetail, TurtleSummary};
use crate::telemetry::IngestMetricsRegistry;

/// Handler state shared across all routes
#[derive(Clone)]
pub struct HandlerState {
    /// Read-only query collaborator
    pub query: QueryService,
    /// Metrics registry backing GET /metrics
    pub metrics: Arc<IngestMetricsRegistry>,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl HandlerState {
    pub fn new(query: QueryService, metrics: Arc<IngestMetricsRegistry>) -> Self {
        Self {
            query,
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(id) => ApiError::NotFound(id),
            StatusError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_info = match &self {
            ApiError::BadRequest(msg) => ErrorInfo::new(self.error_code(), msg),
            ApiError::NotFound(turtle_id) => {
                ErrorInfo::new(self.error_code(), "Turtle does not exist")
                    .with_details(serde_json::json!({ "turtle_id": turtle_id }))
            }
            ApiError::InternalError(msg) => ErrorInfo::new(self.error_code(), msg),
        };

        let response = ApiResponse::<()>::error(error_info, uuid::Uuid::new_v4().to_string());

        (status, Json(response)).into_response()
    }
}

/// Create the router with all routes
pub fn create_router(state: HandlerState) -> Router {
    Router::new()
        .route("/turtles", get(list_turtles))
        .route("/turtles/:turtle_id", get(turtle_detail))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_exposition))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Query parameters for the fleet listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_offline: bool,
}

/// Fleet listing payload
#[derive(Debug, Serialize, Deserialize)]
pub struct TurtleListResult {
    pub turtles: Vec<TurtleSummary>,
    pub count: usize,
}

/// GET /turtles - Fleet listing
///
/// Returns a summary row per turtle; offline turtles appear only when
/// `include_offline=true`.
pub async fn list_turtles(
    State(state): State<HandlerState>,
    Query(params): Query<ListQuery>,
) -> Json<ApiResponse<TurtleListResult>> {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(include_offline = params.include_offline, "GET /turtles");

    let turtles = state.query.list(params.include_offline);
    let result = TurtleListResult {
        count: turtles.len(),
        turtles,
    };

    Json(ApiResponse::success(result, request_id))
}

/// GET /turtles/:turtle_id - Detail for one turtle
///
/// 404 with a structured error envelope when the id is not registered.
pub async fn turtle_detail(
    State(state): State<HandlerState>,
    Path(turtle_id): Path<String>,
) -> Result<Json<ApiResponse<TurtleDetail>>, ApiError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(turtle_id = %turtle_id, "GET /turtles/:turtle_id");

    let detail = state.query.detail(&turtle_id)?;
    Ok(Json(ApiResponse::success(detail, request_id)))
}

/// Health status of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// GET /health response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Number of turtles currently registered
    pub turtles_registered: usize,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub version: String,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<HandlerState>) -> Json<HealthResponse> {
    let turtles_registered = state.query.list(true).len();

    Json(HealthResponse {
        status: HealthStatus::Healthy,
        turtles_registered,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_exposition(State(state): State<HandlerState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode_text()
        .map_err(|err| ApiError::InternalError(err.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TurtleRegistry;
    use crate::validator::StatusValidator;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn make_app() -> (Router, Arc<TurtleRegistry>) {
        let registry = Arc::new(TurtleRegistry::new());
        let metrics = Arc::new(IngestMetricsRegistry::new().unwrap());
        let state = HandlerState::new(QueryService::new(Arc::clone(&registry)), metrics);
        (create_router(state), registry)
    }

    fn seed_online(registry: &TurtleRegistry, id: &str) {
        registry
            .get_or_create(id)
            .unwrap()
            .apply_update(
                &StatusValidator::new(),
                &json!({
                    "online": true,
                    "fuel": 10,
                    "position": { "x": 1, "y": 2, "z": 3 },
                    "orientation": "north",
                    "whitelist": [],
                    "inventory": [],
                }),
            )
            .unwrap();
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_turtles_empty() {
        let (app, _) = make_app();
        let (status, body) = get_json(app, "/turtles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["count"], json!(0));
    }

    #[tokio::test]
    async fn test_list_turtles_filters_offline_by_default() {
        let (app, registry) = make_app();
        seed_online(&registry, "A");
        registry
            .get_or_create("B")
            .unwrap()
            .apply_update(&StatusValidator::new(), &json!({ "online": false }))
            .unwrap();

        let (_, body) = get_json(app.clone(), "/turtles").await;
        assert_eq!(body["data"]["count"], json!(1));
        assert_eq!(body["data"]["turtles"][0]["id"], json!("A"));

        let (_, body) = get_json(app, "/turtles?include_offline=true").await;
        assert_eq!(body["data"]["count"], json!(2));
    }

    #[tokio::test]
    async fn test_turtle_detail_found() {
        let (app, registry) = make_app();
        seed_online(&registry, "A");

        let (status, body) = get_json(app, "/turtles/A").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], json!("A"));
        assert_eq!(body["data"]["fuel"], json!(10));
        assert_eq!(body["data"]["position"]["x"], json!(1));
    }

    #[tokio::test]
    async fn test_turtle_detail_not_found_envelope() {
        let (app, _) = make_app();

        let (status, body) = get_json(app, "/turtles/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
        assert_eq!(body["error"]["details"]["turtle_id"], json!("ghost"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, registry) = make_app();
        seed_online(&registry, "A");

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["turtles_registered"], json!(1));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_renders_text() {
        let (app, _) = make_app();

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("turtle_status_status_updates_applied_total"));
    }
}
