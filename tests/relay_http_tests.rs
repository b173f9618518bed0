use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use herbal_relay::router::{RelayState, relay_router};
use herbal_relay::{Config, ModelRouter};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn app_for(server: &MockServer, api_key: Option<&str>, dynamic_listing: bool) -> Router {
    let cfg = Config {
        api_key: api_key.map(str::to_string),
        endpoint: server.uri(),
        dynamic_listing,
        request_timeout_secs: 1,
        ..Config::default()
    };
    let router = ModelRouter::from_config(&cfg).expect("router from config");
    relay_router(RelayState::new(router))
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": { "code": 404, "message": "model is not found", "status": "NOT_FOUND" }
    }))
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    read_json(resp).await
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    read_json(resp).await
}

async fn read_json(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&body).expect("response body was not json");
    (status, value)
}

#[tokio::test]
async fn generate_returns_reply_from_listed_model() {
    let server = MockServer::start().await;
    let listing = json!({ "models": [
        { "name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
        { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
    ]});
    for version in ["v1", "v1beta"] {
        Mock::given(method("GET"))
            .and(path(format!("/{version}/models")))
            .and(query_param("key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/v1/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", API_KEY))
        .and(body_json(json!({ "contents": [{ "parts": [{ "text": "Benefits of tulsi?" }] }] })))
        .respond_with(text_reply("Tulsi supports immunity."))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), true),
        "/api/gemini",
        json!({ "prompt": "Benefits of tulsi?" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "reply": "Tulsi supports immunity.", "model": "gemini-2.5-flash", "versionUsed": "v1" })
    );
}

#[tokio::test]
async fn falls_back_to_v1beta_when_v1_lacks_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/models/gemini-2.5-pro:generateContent"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .respond_with(text_reply("beta answer"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), false),
        "/api/gemini?model=models/gemini-2.5-pro",
        json!({ "prompt": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "gemini-2.5-pro");
    assert_eq!(body["versionUsed"], "v1beta");
}

#[tokio::test]
async fn fatal_upstream_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Permission denied on resource.", "status": "PERMISSION_DENIED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), false),
        "/api/gemini",
        json!({ "prompt": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permission denied on resource.");
    assert_eq!(body["model"], "gemini-2.5-flash");
    assert_eq!(body["versionTried"], "v1");
    assert!(body["details"].as_str().unwrap().contains("PERMISSION_DENIED"));
}

#[tokio::test]
async fn exhausted_candidates_return_404() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), false),
        "/api/gemini",
        json!({ "prompt": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "All candidate models failed. Last 404 for 'gemini-2.0-pro-exp' using v1beta."
    );
    assert_eq!(body["lastTried"]["candidate"], "gemini-2.0-pro-exp");
    assert_eq!(body["availableModels"], "Could not fetch available models");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 12);
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_upstream_calls() {
    let server = MockServer::start().await;
    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), true),
        "/api/gemini",
        json!({ "prompt": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Prompt is required." }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unusable_bodies_are_treated_as_missing_prompt() {
    let server = MockServer::start().await;
    let app = app_for(&server, Some(API_KEY), true);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/gemini")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let (status, body) = read_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Prompt is required." }));

    for payload in [json!({ "prompt": null }), json!({ "model": 123 })] {
        let (status, body) = post_json(app.clone(), "/api/gemini", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Prompt is required." }));
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_key_is_a_configuration_error() {
    let server = MockServer::start().await;
    let app = app_for(&server, None, true);

    let (status, body) = post_json(app.clone(), "/api/gemini", json!({ "prompt": "hello" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing GEMINI_API_KEY.");

    let (status, _) = get_json(app, "/api/gemini/models").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_reply("too late").set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app_for(&server, Some(API_KEY), false),
        "/api/gemini",
        json!({ "prompt": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("HTTP request error"));
    assert!(!body["error"].as_str().unwrap().contains(API_KEY));
}

#[tokio::test]
async fn models_route_returns_raw_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [{ "name": "models/gemini-2.5-flash" }] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .mount(&server)
        .await;

    let (status, body) = get_json(app_for(&server, Some(API_KEY), true), "/api/gemini/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["v1"]["models"][0]["name"], "models/gemini-2.5-flash");
    assert_eq!(body["v1beta"], json!({}));
}

#[tokio::test]
async fn health_reports_configuration() {
    let server = MockServer::start().await;
    let (status, body) = get_json(app_for(&server, Some(API_KEY), true), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "hasKey": true, "model": "gemini-2.5-flash" }));
}
