//! Sentiment model asset resolution.

use crate::config::ClassifierConfig;
use crate::error::{ClarityError, Result};
use crate::models::ModelManager;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths to the classifier's ONNX graph and tokenizer.
#[derive(Debug, Clone)]
pub struct SentimentPaths {
    pub model_onnx: PathBuf,
    pub tokenizer_json: PathBuf,
}

/// Map a variant name to the ONNX filename inside the repo's `onnx/` folder.
pub fn model_filename(variant: &str) -> &'static str {
    match variant {
        "fp32" => "onnx/model.onnx",
        "fp16" => "onnx/model_fp16.onnx",
        "q8" | "quantized" => "onnx/model_quantized.onnx",
        _ => {
            info!("unknown model variant '{variant}', falling back to fp32");
            "onnx/model.onnx"
        }
    }
}

/// Resolve classifier assets, downloading whatever is not configured locally.
///
/// Explicit `model_path` / `tokenizer_path` entries win over the hub.
///
/// # Errors
///
/// Returns [`ClarityError::Model`] if a local path does not exist or a
/// download fails.
pub fn resolve_sentiment_assets(
    config: &ClassifierConfig,
    manager: &ModelManager,
) -> Result<SentimentPaths> {
    let model_onnx = match &config.model_path {
        Some(path) => existing(path)?,
        None => manager.download_with_progress(
            &config.model_id,
            model_filename(&config.model_variant),
        )?,
    };
    let tokenizer_json = match &config.tokenizer_path {
        Some(path) => existing(path)?,
        None => manager.download_with_progress(&config.model_id, "tokenizer.json")?,
    };

    Ok(SentimentPaths {
        model_onnx,
        tokenizer_json,
    })
}

fn existing(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ClarityError::Model(format!(
            "model file not found: {}",
            path.display()
        )))
    }
}
