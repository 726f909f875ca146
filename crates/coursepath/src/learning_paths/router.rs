use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    progress_map, LearnerProgressSnapshot, LearningPathId, MembershipId, PathDefinition,
    SectionId, UnlockSettings,
};
use super::repository::{LearningPathRepository, RepositoryError};
use super::service::{
    CoursePlacement, LearningPathService, NewCourseMembership, NewSection, PathServiceError,
    SectionUpdate,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePathRequest {
    pub name: String,
}

/// Learner progress posted when rendering a path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub progress: Vec<LearnerProgressSnapshot>,
}

type SharedService<R> = Arc<LearningPathService<R>>;

/// Router builder exposing the admin and learner endpoints for learning paths.
pub fn learning_path_router<R>(service: SharedService<R>) -> Router
where
    R: LearningPathRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/learning-paths",
            get(list_paths_handler::<R>).post(create_path_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/import",
            post(import_path_handler::<R>),
        )
        .route("/api/v1/learning-paths/:path_id", get(get_path_handler::<R>))
        .route(
            "/api/v1/learning-paths/:path_id/courses",
            post(add_course_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/courses/:membership_id",
            axum::routing::delete(remove_course_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/courses/:membership_id/unlock",
            put(unlock_rule_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/courses/:membership_id/placement",
            put(placement_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/sections",
            post(create_section_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/sections/:section_id",
            axum::routing::patch(update_section_handler::<R>)
                .delete(delete_section_handler::<R>),
        )
        .route(
            "/api/v1/learning-paths/:path_id/layout",
            post(layout_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn create_path_handler<R>(
    State(service): State<SharedService<R>>,
    Json(request): Json<CreatePathRequest>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.create_path(&request.name) {
        Ok(path) => (StatusCode::CREATED, Json(path)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_paths_handler<R>(State(service): State<SharedService<R>>) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.list() {
        Ok(paths) => (StatusCode::OK, Json(paths)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn import_path_handler<R>(
    State(service): State<SharedService<R>>,
    Json(definition): Json<PathDefinition>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.import_path(definition) {
        Ok(path) => (StatusCode::CREATED, Json(path)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_path_handler<R>(
    State(service): State<SharedService<R>>,
    Path(path_id): Path<String>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.get(&LearningPathId(path_id)) {
        Ok(path) => (StatusCode::OK, Json(path)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_course_handler<R>(
    State(service): State<SharedService<R>>,
    Path(path_id): Path<String>,
    Json(request): Json<NewCourseMembership>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.add_course(&LearningPathId(path_id), request) {
        Ok(membership) => (StatusCode::CREATED, Json(membership)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn remove_course_handler<R>(
    State(service): State<SharedService<R>>,
    Path((path_id, membership_id)): Path<(String, String)>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.remove_course(&LearningPathId(path_id), &MembershipId(membership_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unlock_rule_handler<R>(
    State(service): State<SharedService<R>>,
    Path((path_id, membership_id)): Path<(String, String)>,
    Json(settings): Json<UnlockSettings>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.set_unlock_rule(
        &LearningPathId(path_id),
        &MembershipId(membership_id),
        &settings,
    ) {
        Ok(membership) => (StatusCode::OK, Json(membership)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn placement_handler<R>(
    State(service): State<SharedService<R>>,
    Path((path_id, membership_id)): Path<(String, String)>,
    Json(placement): Json<CoursePlacement>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.move_course(
        &LearningPathId(path_id),
        &MembershipId(membership_id),
        placement,
    ) {
        Ok(membership) => (StatusCode::OK, Json(membership)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_section_handler<R>(
    State(service): State<SharedService<R>>,
    Path(path_id): Path<String>,
    Json(request): Json<NewSection>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.create_section(&LearningPathId(path_id), request) {
        Ok(section) => (StatusCode::CREATED, Json(section)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_section_handler<R>(
    State(service): State<SharedService<R>>,
    Path((path_id, section_id)): Path<(String, String)>,
    Json(update): Json<SectionUpdate>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.update_section(&LearningPathId(path_id), &SectionId(section_id), update) {
        Ok(section) => (StatusCode::OK, Json(section)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_section_handler<R>(
    State(service): State<SharedService<R>>,
    Path((path_id, section_id)): Path<(String, String)>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    match service.delete_section(&LearningPathId(path_id), &SectionId(section_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn layout_handler<R>(
    State(service): State<SharedService<R>>,
    Path(path_id): Path<String>,
    Json(request): Json<LayoutRequest>,
) -> Response
where
    R: LearningPathRepository + 'static,
{
    let progress = progress_map(request.progress);
    match service.layout(&LearningPathId(path_id), &progress) {
        Ok(layout) => (StatusCode::OK, Json(layout)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PathServiceError) -> Response {
    let status = match &err {
        PathServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PathServiceError::Repository(RepositoryError::NotFound)
        | PathServiceError::MembershipNotFound(_)
        | PathServiceError::SectionNotFound(_) => StatusCode::NOT_FOUND,
        PathServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PathServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
