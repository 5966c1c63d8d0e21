//! HTTP transport tests against a server bound to an ephemeral port.

use crate::helpers::{RecordingBackend, ScriptedModel, recording_pipeline};
use clarity::ChatPipeline;
use clarity::config::ServerConfig;
use clarity::server::{ChatServer, EMPTY_INPUT_MESSAGE};
use serde_json::{Value, json};
use std::sync::Arc;

async fn start(pipeline: ChatPipeline) -> ChatServer {
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    };
    ChatServer::start(Arc::new(pipeline), &config).await.unwrap()
}

fn chat_url(server: &ChatServer) -> String {
    format!("http://{}/api/chat", server.addr())
}

#[tokio::test]
async fn chat_returns_envelope() {
    let backend = Arc::new(RecordingBackend::default());
    let server = start(recording_pipeline(ScriptedModel::negative(), backend)).await;

    let response = reqwest::Client::new()
        .post(chat_url(&server))
        .json(&json!({"user_text": "I lost my job today"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sentiment"], "Negative");
    assert!(!body["reply"].as_str().unwrap().is_empty());
    assert!(body.get("speak_note").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn blank_or_missing_text_is_400() {
    let backend = Arc::new(RecordingBackend::default());
    let model = ScriptedModel::negative();
    let server = start(recording_pipeline(model.clone(), backend.clone())).await;
    let client = reqwest::Client::new();

    for payload in [json!({"user_text": "   "}), json!({"user_text": ""}), json!({})] {
        let response = client
            .post(chat_url(&server))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "{payload}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": EMPTY_INPUT_MESSAGE}));
    }

    assert_eq!(model.calls(), 0);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let backend = Arc::new(RecordingBackend::default());
    let server = start(recording_pipeline(ScriptedModel::negative(), backend)).await;

    let response = reqwest::Client::new()
        .post(chat_url(&server))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], EMPTY_INPUT_MESSAGE);
}

#[tokio::test]
async fn inference_failure_is_500() {
    let backend = Arc::new(RecordingBackend::default());
    let server = start(recording_pipeline(ScriptedModel::failing(), backend.clone())).await;

    let response = reqwest::Client::new()
        .post(chat_url(&server))
        .json(&json!({"user_text": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("onnx session failed")
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn health_reports_version() {
    let backend = Arc::new(RecordingBackend::default());
    let server = start(recording_pipeline(ScriptedModel::positive(), backend)).await;

    let body: Value = reqwest::get(format!("http://{}/health", server.addr()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn shutdown_stops_the_server() {
    let backend = Arc::new(RecordingBackend::default());
    let server = start(recording_pipeline(ScriptedModel::positive(), backend)).await;
    let addr = server.addr();

    server.shutdown();
    server.wait().await.unwrap();

    let result = reqwest::get(format!("http://{addr}/health")).await;
    assert!(result.is_err());
}
