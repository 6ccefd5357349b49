mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::test_router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let (app, _store) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/tasks")
                .header(header::ORIGIN, "http://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn trailing_slash_routes_reject_empty_id() {
    let (app, store) = test_router();

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri("/tasks/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{method}");
        assert_eq!(body_json(response).await, json!({ "ok": 0 }), "{method}");
    }

    assert_eq!(store.operation_count(), 0);
}

#[tokio::test]
async fn non_object_create_body_is_rejected() {
    let (app, store) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/tasks")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[1, 2, 3]"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_json(response).await, json!({ "ok": 0 }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _store) = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
