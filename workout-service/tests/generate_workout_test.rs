//! Router-level tests for `POST /generate_workout` using in-process providers.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use workout_service::services::providers::mock::MockTextProvider;
use workout_service::startup::{build_router, AppState};

fn app_with(provider: Arc<MockTextProvider>) -> Router {
    build_router(AppState::new(provider))
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/generate_workout")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn prompt_is_relayed_and_result_returned() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(post_json(r#"{"prompt": "3-day strength program"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        serde_json::json!({"result": "Mock workout for: 3-day strength program"})
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn missing_prompt_is_sent_as_empty_text() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let response = app.oneshot(post_json("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({"result": "Mock workout for: "}));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn provider_failure_returns_500_with_error() {
    let provider = Arc::new(MockTextProvider::new(false));
    let app = app_with(provider);

    let response = app
        .oneshot(post_json(r#"{"prompt": "legs"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(!object["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_json_returns_500_without_calling_provider() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let response = app.oneshot(post_json("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn non_object_and_non_string_prompt_return_500() {
    for payload in ["null", "[]", r#"{"prompt": 5}"#, r#"{"prompt": null}"#] {
        let provider = Arc::new(MockTextProvider::new(true));
        let response = app_with(provider.clone())
            .oneshot(post_json(payload))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "payload {payload}"
        );
        let body = json_body(response).await;
        assert!(body["error"].is_string(), "payload {payload}");
        assert_eq!(provider.calls(), 0);
    }
}

#[tokio::test]
async fn missing_content_type_returns_500() {
    let app = app_with(Arc::new(MockTextProvider::new(true)));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/generate_workout")
                .body(Body::from(r#"{"prompt": "legs"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn get_on_route_is_method_not_allowed() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/generate_workout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/generate")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn requests_are_independent() {
    let provider = Arc::new(MockTextProvider::new(true));
    let app = app_with(provider.clone());

    let first = app
        .clone()
        .oneshot(post_json(r#"{"prompt": "upper body"}"#))
        .await
        .unwrap();
    let second = app.oneshot(post_json("{}")).await.unwrap();

    assert_eq!(
        json_body(first).await,
        serde_json::json!({"result": "Mock workout for: upper body"})
    );
    assert_eq!(
        json_body(second).await,
        serde_json::json!({"result": "Mock workout for: "})
    );
}

#[tokio::test]
async fn response_carries_request_id() {
    let app = app_with(Arc::new(MockTextProvider::new(true)));

    let mut request = post_json("{}");
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
