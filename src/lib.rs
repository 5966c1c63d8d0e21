//! Clarity: sentiment-aware empathetic replies with optional spoken output.
//!
//! Every utterance goes through the same fixed pipeline:
//! normalize → classify sentiment → build prompt → generate reply → speak
//!
//! # Architecture
//!
//! - **Normalization**: strips links, mentions and `#` markers
//! - **Sentiment**: three-way RoBERTa classifier via ONNX Runtime (`ort`)
//! - **Prompt**: fixed empathetic template keyed by the sentiment label
//! - **LLM**: OpenAI-compatible chat completions with fallback replies
//! - **Speech**: remote text-to-speech played on the host via `cpal`
//! - **Server**: JSON transport via `axum`

pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod sentiment;
pub mod server;
pub mod speech;
pub mod startup;
pub mod tts;

pub use config::ClarityConfig;
pub use error::{ClarityError, Result};
pub use pipeline::{ChatPipeline, ResponseEnvelope};
pub use sentiment::SentimentLabel;
