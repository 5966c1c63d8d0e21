//! OpenAI-compatible chat completions backend.
//!
//! Works against OpenRouter, OpenAI, Ollama and anything else that speaks
//! `POST /v1/chat/completions`.

use super::{CompletionBackend, CompletionError};
use crate::config::LlmConfig;
use crate::error::{ClarityError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Non-streaming chat completions client.
pub struct ApiCompletion {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    app_referer: Option<String>,
    app_title: Option<String>,
}

impl ApiCompletion {
    /// Build a client from config, resolving the API key.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Config`] if the key reference cannot be
    /// resolved and [`ClarityError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.resolve()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClarityError::Llm(format!("failed to build HTTP client: {e}")))?;

        let url = chat_completions_url(&config.api_url);
        info!("completion API configured: {url} model={}", config.api_model);

        Ok(Self {
            client,
            url,
            model: config.api_model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            app_referer: config.app_referer.clone(),
            app_title: config.app_title.clone(),
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if let Some(t) = self.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if let Some(n) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(n);
        }
        body
    }
}

#[async_trait]
impl CompletionBackend for ApiCompletion {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(referer) = &self.app_referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.app_title {
            request = request.header("X-Title", title);
        }

        let response = request
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Request(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }
        parse_completion(&body)
    }
}

/// `{base}/v1/chat/completions`, tolerating a base that already ends in `/v1`.
pub fn chat_completions_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/chat/completions")
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> CompletionError {
    let message = extract_error_message(body);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || error_code(body) == Some(429) {
        return CompletionError::RateLimited(message);
    }
    CompletionError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Pull the generated text out of a successful response body.
///
/// Some gateways report upstream failures inside a 200 body as
/// `{"error": {"code": ..., "message": ...}}`.
fn parse_completion(body: &str) -> std::result::Result<String, CompletionError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("not JSON: {e}")))?;

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map_or_else(|| error.to_string(), String::from);
        return match code_of(error) {
            Some(429) => Err(CompletionError::RateLimited(message)),
            code => Err(CompletionError::Http {
                status: code.unwrap_or(200),
                message,
            }),
        };
    }

    value["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| {
            CompletionError::InvalidResponse("missing choices[0].message.content".to_owned())
        })
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

fn error_code(body: &str) -> Option<u16> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    code_of(value.get("error")?)
}

/// `error.code` as a number, accepting both `429` and `"429"`.
fn code_of(error: &serde_json::Value) -> Option<u16> {
    let code = error.get("code")?;
    code.as_u64()
        .and_then(|c| u16::try_from(c).ok())
        .or_else(|| code.as_str().and_then(|s| s.parse().ok()))
}
