//! Reply generation through an external completion service.
//!
//! [`ReplyGenerator`] never fails: rate limiting becomes a fixed apology and
//! every other backend problem becomes a `"Something went wrong: ..."` reply.

pub mod api;

pub use api::ApiCompletion;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply returned when the completion service is rate limiting us.
pub const RATE_LIMIT_REPLY: &str = "I'm really sorry, but I'm getting too many requests right now. Could you please try again in a moment?";

/// Why a completion request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// HTTP 429 or an equivalent signal in the response body.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Non-success status or an in-body error object.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// A service that turns one prompt into generated text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue a single completion request.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Error-absorbing wrapper around a [`CompletionBackend`].
#[derive(Clone)]
pub struct ReplyGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl ReplyGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Generate a reply for `prompt`. One attempt, no retries.
    pub async fn generate_reply(&self, prompt: &str) -> String {
        debug!(prompt_chars = prompt.chars().count(), "requesting completion");
        match self.backend.complete(prompt).await {
            Ok(text) => text,
            Err(e) if e.is_rate_limited() => {
                warn!("completion service rate limited: {e}");
                RATE_LIMIT_REPLY.to_owned()
            }
            Err(e) => {
                warn!("completion failed: {e}");
                format!("Something went wrong: {e}")
            }
        }
    }
}

impl std::fmt::Debug for ReplyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyGenerator").finish_non_exhaustive()
    }
}
