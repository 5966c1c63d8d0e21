//! RoBERTa-style sequence classifier exported to ONNX.
//!
//! Expects a graph with `input_ids` and `attention_mask` inputs (both `i64`,
//! shape `[1, seq_len]`) and a single `[1, 3]` logits output.

use super::SentimentModel;
use super::download::SentimentPaths;
use crate::config::ClassifierConfig;
use crate::error::{ClarityError, Result};
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor;
use std::collections::HashMap;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

/// ONNX Runtime backed [`SentimentModel`].
///
/// The session is behind a mutex because `Session::run` needs `&mut`.
pub struct OnnxSentimentModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxSentimentModel {
    /// Load the session and tokenizer from resolved asset paths.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Model`] if either file cannot be loaded.
    pub fn from_paths(paths: &SentimentPaths, config: &ClassifierConfig) -> Result<Self> {
        info!("loading sentiment model: {}", paths.model_onnx.display());
        let threads = config.intra_threads.max(1);
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(threads))
            .and_then(|b| b.commit_from_file(&paths.model_onnx))
            .map_err(|e| ClarityError::Model(format!("failed to load sentiment model: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&paths.tokenizer_json).map_err(|e| {
            ClarityError::Model(format!(
                "failed to load tokenizer {}: {e}",
                paths.tokenizer_json.display()
            ))
        })?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| ClarityError::Model(format!("invalid truncation settings: {e}")))?;

        info!(
            "sentiment model ready (variant={}, max_len={})",
            config.model_variant, config.max_sequence_length
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClarityError::ModelInference(format!("tokenization failed: {e}")))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        if ids.is_empty() {
            return Err(ClarityError::ModelInference(
                "tokenizer produced no tokens".into(),
            ));
        }
        Ok((ids, mask))
    }
}

impl SentimentModel for OnnxSentimentModel {
    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let (ids, mask) = self.encode(text)?;
        let seq_len = ids.len();

        let input_ids = Tensor::from_array(([1_usize, seq_len], ids)).map_err(|e| {
            ClarityError::ModelInference(format!("failed to create input_ids tensor: {e}"))
        })?;
        let attention_mask = Tensor::from_array(([1_usize, seq_len], mask)).map_err(|e| {
            ClarityError::ModelInference(format!("failed to create attention_mask tensor: {e}"))
        })?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input_ids".to_string(), input_ids.into());
        feed.insert("attention_mask".to_string(), attention_mask.into());

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClarityError::ModelInference("sentiment session poisoned".into()))?;
        let outputs = session
            .run(SessionInputs::from(feed))
            .map_err(|e| ClarityError::ModelInference(format!("ONNX inference failed: {e}")))?;

        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClarityError::ModelInference(format!("failed to extract logits: {e}")))?;

        Ok(data.to_vec())
    }
}
