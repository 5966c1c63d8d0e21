//! JSON HTTP transport for the reply pipeline.
//!
//! ## Endpoints
//!
//! - `POST /api/chat`: `{"user_text": "..."}` in, response envelope out
//! - `GET /health`: liveness probe

use crate::config::ServerConfig;
use crate::error::{ClarityError, Result};
use crate::pipeline::ChatPipeline;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Body returned with 400 for a missing or blank utterance.
pub const EMPTY_INPUT_MESSAGE: &str = "Empty input. Please say or type something.";

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_text: Option<String>,
}

/// Error body for non-200 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ChatPipeline>,
}

/// Routes for the chat transport.
pub fn router(pipeline: Arc<ChatPipeline>) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .with_state(AppState { pipeline })
}

/// A running HTTP server.
pub struct ChatServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ChatServer {
    /// Bind to `config.host:config.port` and start serving in the background.
    ///
    /// Port `0` picks a free port; see [`ChatServer::addr`].
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Server`] if the address cannot be bound.
    pub async fn start(pipeline: Arc<ChatPipeline>, config: &ServerConfig) -> Result<Self> {
        let app = router(pipeline);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ClarityError::Server(format!("bind to {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ClarityError::Server(format!("failed to get local addr: {e}")))?;

        info!("listening on http://{addr}");

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal.cancelled_owned())
                .await
            {
                error!("HTTP server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and let in-flight requests finish.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the server task to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Server`] if the task panicked.
    pub async fn wait(mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .await
            .map_err(|e| ClarityError::Server(format!("server task failed: {e}")))
    }
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        let user_text = match payload {
            Ok(Json(request)) => request.user_text.unwrap_or_default(),
            Err(rejection) => {
                warn!("rejected request body: {rejection}");
                String::new()
            }
        };
        if user_text.trim().is_empty() {
            return error_response(StatusCode::BAD_REQUEST, EMPTY_INPUT_MESSAGE);
        }

        match state.pipeline.respond(&user_text).await {
            Ok(envelope) => Json(envelope).into_response(),
            Err(ClarityError::EmptyInput) => {
                error_response(StatusCode::BAD_REQUEST, EMPTY_INPUT_MESSAGE)
            }
            Err(e) => {
                error!("request failed: {e}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_owned(),
        }),
    )
        .into_response()
}

impl Drop for ChatServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
