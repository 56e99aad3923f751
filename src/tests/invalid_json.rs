use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use tower::Service;

use crate::tests::helper;

#[tokio::test]
async fn test_invalid_json() {
    let mut app = helper::setup_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.call(request).await.unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}

#[tokio::test]
async fn test_missing_content_type() {
    let mut app = helper::setup_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .body(Body::from(r#"{ "name": "Example App" }"#))
        .unwrap();

    let response = app.call(request).await.unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
}
