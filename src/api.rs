use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::db::{fetch_admission_data, AdmissionSource};
use crate::error::AppError;
use crate::models::{ChartsResponse, DashboardResponse, DataQualityReport, SummaryStatistics};
use crate::pipeline;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AdmissionSource>,
    pub default_year: i32,
    pub cors_allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

impl AppState {
    fn year(&self, query: &YearQuery) -> i32 {
        query.year.unwrap_or(self.default_year)
    }
}

/// Any failure behind an endpoint. Rendered as an opaque 500; the cause is
/// only logged.
#[derive(Debug)]
pub struct ApiError {
    what: &'static str,
    source: AppError,
}

impl ApiError {
    fn context(what: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| Self { what, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.source, "failed to load {}", self.what);
        let body = Json(json!({ "detail": format!("Could not load {}", self.what) }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/healthz", get(healthz_handler))
        .route("/analytics/dashboard", get(dashboard_handler))
        .route("/analytics/summary", get(summary_handler))
        .route("/analytics/charts", get(charts_handler))
        .route("/analytics/data-quality", get(data_quality_handler))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Admission Analytics API" }))
}

async fn healthz_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let year = state.year(&query);
    let data = fetch_admission_data(state.source.as_ref(), year)
        .await
        .map_err(ApiError::context("dashboard analytics"))?;
    info!(year, rows = data.view.row_count(), "serving dashboard");
    Ok(Json(pipeline::build_dashboard(year, &data)))
}

async fn summary_handler(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<SummaryStatistics>, ApiError> {
    let year = state.year(&query);
    let view = state
        .source
        .admission_view(year)
        .await
        .map_err(ApiError::context("summary analytics"))?;
    info!(year, rows = view.row_count(), "serving summary");
    Ok(Json(pipeline::build_summary(&view)))
}

async fn charts_handler(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<ChartsResponse>, ApiError> {
    let year = state.year(&query);
    let data = fetch_admission_data(state.source.as_ref(), year)
        .await
        .map_err(ApiError::context("chart analytics"))?;
    info!(year, rows = data.view.row_count(), "serving charts");
    Ok(Json(pipeline::build_charts(year, &data)))
}

async fn data_quality_handler(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Json<DataQualityReport>, ApiError> {
    let year = state.year(&query);
    let view = state
        .source
        .admission_view(year)
        .await
        .map_err(ApiError::context("data quality statistics"))?;
    Ok(Json(pipeline::data_quality(&view)))
}

async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|value| value.to_str().ok())
        .filter(|value| state.cors_allowed_origins.iter().any(|allowed| allowed == value))
        .and_then(|value| HeaderValue::from_str(value).ok());

    let mut resp = if *req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    if let Some(origin) = origin {
        let headers = resp.headers_mut();
        headers.insert("access-control-allow-origin", origin);
        headers.insert("access-control-allow-methods", HeaderValue::from_static("GET,OPTIONS"));
        headers.insert("access-control-allow-headers", HeaderValue::from_static("*"));
        headers.insert("vary", HeaderValue::from_static("origin"));
    }
    resp
}
