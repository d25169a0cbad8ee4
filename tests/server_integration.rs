use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use salla_agent_relay::{
    config::Environment,
    llm::UpstreamError,
    server::INPUT_REQUIRED,
};
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

mod common;

use common::{TEST_API_KEY, body_json, create_test_app, json_request, mocks::MockBackend};

fn assert_cors_headers(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}

#[tokio::test]
async fn test_valid_request_returns_output_text() {
    let backend = MockBackend::replying("Here is your banner patch");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let request = json_request(
        "POST",
        "/api/agent",
        json!({ "input_as_text": "  Add a promo banner \n" }).to_string(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);
    assert_eq!(
        body_json(response).await,
        json!({ "output_text": "Here is your banner patch" })
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input, "Add a promo banner");
    assert_eq!(calls[0].api_key, TEST_API_KEY);
}

#[tokio::test]
async fn test_get_is_method_not_allowed_regardless_of_body() {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let request = json_request(
        "GET",
        "/api/agent",
        json!({ "input_as_text": "hello" }).to_string(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_cors_headers(&response);
    assert_eq!(body_json(response).await, json!({ "error": "Method not allowed" }));
    assert!(backend.calls().is_empty());
}

#[rstest]
#[case("PUT")]
#[case("DELETE")]
#[case("PATCH")]
#[tokio::test]
async fn test_other_methods_are_rejected(#[case] method: &str) {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let response = app
        .oneshot(json_request(method, "/api/agent", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_options_preflight_has_no_body() {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/agent")
        .header("origin", "https://theme.example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
    assert!(backend.calls().is_empty());
}

#[rstest]
#[case::empty(json!({ "input_as_text": "" }).to_string())]
#[case::blank(json!({ "input_as_text": "   " }).to_string())]
#[case::missing(json!({ "message": "hello" }).to_string())]
#[case::wrong_type(json!({ "input_as_text": 42 }).to_string())]
#[tokio::test]
async fn test_invalid_input_is_rejected_before_backend(#[case] body: String) {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let response = app
        .oneshot(json_request("POST", "/api/agent", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": INPUT_REQUIRED }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let response = app
        .oneshot(json_request("POST", "/api/agent", "invalid json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_missing_credential_never_calls_backend() {
    let backend = MockBackend::replying("unused");
    let app = create_test_app(backend.clone(), None, Environment::Production);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/agent",
            json!({ "input_as_text": "hello" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&response);
    let body = body_json(response).await;
    assert_eq!(body["error"], "OpenAI API key not configured");
    assert!(body["message"].as_str().unwrap().contains("OPENAI_API_KEY"));
    assert!(backend.calls().is_empty());
}

#[rstest]
#[case::rate_limited(
    UpstreamError::RateLimited("quota exhausted".into()),
    StatusCode::TOO_MANY_REQUESTS,
    "Rate limit exceeded"
)]
#[case::unavailable(
    UpstreamError::Unavailable("connection refused".into()),
    StatusCode::INTERNAL_SERVER_ERROR,
    "Agent dependencies not available"
)]
#[case::credential(
    UpstreamError::CredentialRejected("Incorrect API key provided".into()),
    StatusCode::INTERNAL_SERVER_ERROR,
    "OpenAI API key rejected"
)]
#[case::failed(
    UpstreamError::Failed("The server had an error".into()),
    StatusCode::INTERNAL_SERVER_ERROR,
    "Internal server error"
)]
#[tokio::test]
async fn test_upstream_failures_map_to_distinct_payloads(
    #[case] error: UpstreamError,
    #[case] status: StatusCode,
    #[case] label: &str,
) {
    let backend = MockBackend::failing(error);
    let app = create_test_app(backend.clone(), Some(TEST_API_KEY), Environment::Production);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/agent",
            json!({ "input_as_text": "hello" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["error"], label);
    assert!(body["message"].is_string());
    assert!(body.get("stack").is_none());
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_stack_is_exposed_only_in_development() {
    let backend = MockBackend::failing(UpstreamError::Failed("boom".into()));
    let app = create_test_app(backend, Some(TEST_API_KEY), Environment::Development);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/agent",
            json!({ "input_as_text": "hello" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "boom");
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn test_blank_backend_reply_is_server_error() {
    let backend = MockBackend::replying("  ");
    let app = create_test_app(backend, Some(TEST_API_KEY), Environment::Production);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/agent",
            json!({ "input_as_text": "hello" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("missing output_text")
    );
}

#[tokio::test]
async fn test_wrong_path() {
    let app = create_test_app(
        MockBackend::replying("unused"),
        Some(TEST_API_KEY),
        Environment::Production,
    );

    let response = app
        .oneshot(json_request("POST", "/wrong-path", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
