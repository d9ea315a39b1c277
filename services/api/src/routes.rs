use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use reliefplan::error::AppError;
use reliefplan::needs::{FundingMetrics, MetricsOverrides};
use reliefplan::planning::{Recommendation, Report};

use crate::infra::{AppState, PlannerState};

pub(crate) fn router(planner: PlannerState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/regions/:region/metrics",
            axum::routing::get(region_metrics_endpoint),
        )
        .route("/api/v1/reports", axum::routing::post(report_endpoint))
        .route("/api/v1/solutions", axum::routing::get(solution_endpoint))
        .route(
            "/api/v1/solutions/category",
            axum::routing::get(category_endpoint),
        )
        .layer(Extension(planner))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct YearParams {
    pub(crate) year: Option<i32>,
}

pub(crate) async fn region_metrics_endpoint(
    Extension(state): Extension<PlannerState>,
    Path(region): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<Json<FundingMetrics>, AppError> {
    let metrics = state.planner.metrics(&region, params.year)?;
    Ok(Json(metrics))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    pub(crate) region: String,
    #[serde(default)]
    pub(crate) year: Option<i32>,
    #[serde(default)]
    pub(crate) overrides: MetricsOverrides,
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<PlannerState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<Report>, AppError> {
    let report = state
        .planner
        .generate_report(&payload.region, payload.year, &payload.overrides)
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SolutionParams {
    pub(crate) region: String,
    pub(crate) category: String,
}

pub(crate) async fn solution_endpoint(
    Extension(state): Extension<PlannerState>,
    Query(params): Query<SolutionParams>,
) -> Json<Recommendation> {
    Json(state.advisor.lookup(&params.region, &params.category).await)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryParams {
    pub(crate) region: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub(crate) region: String,
    pub(crate) category: &'static str,
}

pub(crate) async fn category_endpoint(
    Extension(state): Extension<PlannerState>,
    Query(params): Query<CategoryParams>,
) -> Json<CategoryResponse> {
    let category = state.advisor.classify(&params.region).await;
    Json(CategoryResponse {
        region: params.region,
        category: category.label(),
    })
}
