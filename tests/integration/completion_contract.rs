//! Chat completions contract tests against a mock OpenAI-compatible server.

use crate::helpers::{completion_body, llm_config};
use clarity::config::SecretRef;
use clarity::llm::{ApiCompletion, CompletionBackend, CompletionError, RATE_LIMIT_REPLY, ReplyGenerator};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn request_carries_model_prompt_and_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test/model",
            "messages": [{"role": "user", "content": "Say hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi!")))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    assert_eq!(api.complete("Say hi").await.unwrap(), "Hi!");
}

#[tokio::test]
async fn attribution_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("HTTP-Referer", "https://clarity.example"))
        .and(header("X-Title", "Clarity AI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = llm_config(&server.uri());
    config.app_referer = Some("https://clarity.example".into());
    let api = ApiCompletion::new(&config).unwrap();
    assert_eq!(api.complete("x").await.unwrap(), "ok");
}

#[tokio::test]
async fn no_key_sends_no_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("local")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = llm_config(&server.uri());
    config.api_key = SecretRef::None;
    let api = ApiCompletion::new(&config).unwrap();
    assert_eq!(api.complete("x").await.unwrap(), "local");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn status_429_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit exceeded: free-models-per-min", "code": 429}
        })))
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    let err = api.complete("x").await.unwrap_err();
    assert_eq!(
        err,
        CompletionError::RateLimited("Rate limit exceeded: free-models-per-min".into())
    );
}

#[tokio::test]
async fn in_body_429_with_ok_status_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "Provider returned error", "code": 429}
        })))
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    assert!(api.complete("x").await.unwrap_err().is_rate_limited());
}

#[tokio::test]
async fn server_error_keeps_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "Internal Server Error"}
        })))
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    assert_eq!(
        api.complete("x").await.unwrap_err(),
        CompletionError::Http {
            status: 500,
            message: "Internal Server Error".into()
        }
    );
}

#[tokio::test]
async fn missing_content_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    assert!(matches!(
        api.complete("x").await.unwrap_err(),
        CompletionError::InvalidResponse(_)
    ));
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let api = ApiCompletion::new(&llm_config(&uri)).unwrap();
    assert!(matches!(
        api.complete("x").await.unwrap_err(),
        CompletionError::Request(_)
    ));
}

#[tokio::test]
async fn generator_turns_429_into_apology() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    let reply = ReplyGenerator::new(Arc::new(api)).generate_reply("x").await;
    assert_eq!(reply, RATE_LIMIT_REPLY);
}

#[tokio::test]
async fn generator_reports_other_failures_inline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "No auth credentials found"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiCompletion::new(&llm_config(&server.uri())).unwrap();
    let reply = ReplyGenerator::new(Arc::new(api)).generate_reply("x").await;
    assert!(reply.starts_with("Something went wrong: "));
    assert!(reply.contains("No auth credentials found"));
}
