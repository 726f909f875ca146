use super::common::*;
use axum::body::{to_bytes, Body};
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::learning_paths::router::{create_path_handler, CreatePathRequest};
use crate::learning_paths::{LearningPathService, UnlockSettings};

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn create_handler_returns_unprocessable_for_blank_name() {
    let (service, _) = build_service();

    let response = create_path_handler::<MemoryRepository>(
        State(Arc::new(service)),
        Json(CreatePathRequest {
            name: String::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_handler_returns_internal_error_on_repository_failure() {
    let service = LearningPathService::new(Arc::new(UnavailableRepository), policy());

    let response = create_path_handler::<UnavailableRepository>(
        State(Arc::new(service)),
        Json(CreatePathRequest {
            name: "Offline".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn get_handler_returns_not_found_for_unknown_path() {
    let (service, _) = build_service();

    let response = crate::learning_paths::router::get_path_handler::<MemoryRepository>(
        State(Arc::new(service)),
        Path("path-unknown".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn layout_route_reports_locked_courses() {
    let (service, _) = build_service();
    let path = service.create_path("Routing").expect("path created");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/learning-paths/{}/courses", path.id),
            json!({ "course_id": "a", "title": "Intro" }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/learning-paths/{}/courses", path.id),
            json!({
                "course_id": "b",
                "title": "Deep Dive",
                "unlock": UnlockSettings::after_score("a", 70),
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["unlock"]["type"], "after_score");
    assert_eq!(created["unlock"]["min_score"], 70);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/learning-paths/{}/layout", path.id),
            json!({ "progress": [{ "course_id": "a", "completed": true, "score": 69.0 }] }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::OK);

    let layout = body_json(response).await;
    let ungrouped = layout["ungrouped"].as_array().expect("ungrouped list");
    assert_eq!(ungrouped.len(), 2);
    assert_eq!(ungrouped[1]["course_id"], "b");
    assert_eq!(ungrouped[1]["locked"], true);
    assert_eq!(ungrouped[1]["reason"], "locked_awaiting_score");
    assert_eq!(
        ungrouped[1]["hint"],
        "Unlocks after scoring at least 70% in Intro"
    );
    assert_eq!(layout["summary"]["locked"], 1);
}

#[tokio::test]
async fn unlock_route_rejects_invalid_settings() {
    let (service, _) = build_service();
    let path = service.create_path("Rules").expect("path created");
    let membership = service
        .add_course(
            &path.id,
            crate::learning_paths::NewCourseMembership {
                course_id: "a".into(),
                title: "Intro".to_string(),
                section_id: None,
                order: None,
                unlock: UnlockSettings::default(),
            },
        )
        .expect("course added");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!(
                "/api/v1/learning-paths/{}/courses/{}/unlock",
                path.id, membership.id
            ),
            json!({ "unlock_type": "after_score", "unlock_course_id": "a", "min_score": 50 }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("cannot unlock after itself"));
}

#[tokio::test]
async fn section_routes_create_and_delete() {
    let (service, _) = build_service();
    let path = service.create_path("Sections").expect("path created");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/learning-paths/{}/sections", path.id),
            json!({ "name": "Week 1" }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let section = body_json(response).await;
    let section_id = section["id"].as_str().expect("section id").to_string();

    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/learning-paths/{}/sections/{}", path.id, section_id),
            json!({ "name": "Week One" }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Week One");

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!(
                    "/api/v1/learning-paths/{}/sections/{}",
                    path.id, section_id
                ))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!(
                    "/api/v1/learning-paths/{}/sections/{}",
                    path.id, section_id
                ))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_and_list_routes() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/learning-paths/import",
            json!({
                "name": "Imported",
                "courses": [
                    { "id": "m-a", "course_id": "a", "title": "Intro", "order": 1 },
                    {
                        "id": "m-b",
                        "course_id": "b",
                        "title": "Next",
                        "order": 2,
                        "unlock": { "unlock_type": "after_course", "unlock_course_id": "a" }
                    }
                ]
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let imported = body_json(response).await;
    assert_eq!(imported["memberships"][1]["unlock"]["type"], "after_course");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/learning-paths/import",
            json!({
                "name": "Broken",
                "courses": [
                    {
                        "id": "m-a",
                        "course_id": "a",
                        "title": "Intro",
                        "order": 1,
                        "unlock": { "unlock_type": "after_score", "unlock_course_id": "b" }
                    },
                    { "id": "m-b", "course_id": "b", "title": "Next", "order": 2 }
                ]
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/learning-paths")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::OK);
    let paths = body_json(response).await;
    assert_eq!(paths.as_array().expect("path list").len(), 1);
}
