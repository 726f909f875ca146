use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use coursepath::error::AppError;
use coursepath::learning_paths::{
    build_layout, learning_path_router, progress_map, LearnerProgressSnapshot,
    LearningPathRepository, LearningPathService, PathDefinition, PathGuard, PathLayout,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Stateless evaluation of a path definition posted together with learner progress.
#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    pub(crate) path: PathDefinition,
    #[serde(default)]
    pub(crate) progress: Vec<LearnerProgressSnapshot>,
}

pub(crate) fn with_learning_path_routes<R>(service: Arc<LearningPathService<R>>) -> axum::Router
where
    R: LearningPathRepository + 'static,
{
    learning_path_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/learning-paths/evaluate",
            axum::routing::post(evaluate_endpoint),
        )
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

pub(crate) async fn evaluate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<PathLayout>, AppError> {
    let EvaluateRequest { path, progress } = payload;

    let learning_path = PathGuard::new(state.policy).path_from_definition(path)?;
    let progress = progress_map(progress);
    let layout = build_layout(
        &learning_path.sections,
        &learning_path.memberships,
        &progress,
    );

    Ok(Json(layout))
}
