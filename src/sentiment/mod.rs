//! Three-way sentiment classification of user utterances.
//!
//! The classifier normalizes the text, asks a [`SentimentModel`] for one raw
//! score per label, turns the scores into probabilities with a softmax, and
//! falls back to [`SentimentLabel::Neutral`] whenever the strongest label is
//! not confident enough.

pub mod download;
pub mod onnx;

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::error::{ClarityError, Result};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tone of an utterance.
///
/// Variant order matches the model's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// All labels in model output order.
    pub const ALL: [SentimentLabel; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Capitalized display name, as it appears in responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Anything that maps a piece of text to three raw scores
/// (negative, neutral, positive).
///
/// Implementations are synchronous and may be CPU heavy; callers on an async
/// runtime should invoke them from a blocking thread.
pub trait SentimentModel: Send + Sync {
    /// Raw, unnormalized scores in [`SentimentLabel::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::ModelInference`] when the model cannot
    /// process the text.
    fn logits(&self, text: &str) -> Result<Vec<f32>>;
}

/// Full outcome of one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Final label after the confidence rule.
    pub label: SentimentLabel,
    /// Label with the highest probability, before the confidence rule.
    pub dominant: SentimentLabel,
    /// Probability of `dominant`.
    pub confidence: f32,
    /// Softmax probabilities in [`SentimentLabel::ALL`] order.
    pub probabilities: [f32; 3],
}

impl Classification {
    /// Apply softmax and the confidence rule to raw model scores.
    ///
    /// Ties between the top probabilities resolve to the earliest label in
    /// [`SentimentLabel::ALL`].
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::ModelInference`] if there are not exactly
    /// three scores or any score is not finite.
    pub fn from_logits(logits: &[f32], threshold: f32) -> Result<Self> {
        let scores: [f32; 3] = logits.try_into().map_err(|_| {
            ClarityError::ModelInference(format!(
                "expected 3 sentiment scores, model returned {}",
                logits.len()
            ))
        })?;
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ClarityError::ModelInference(format!(
                "model returned non-finite scores: {scores:?}"
            )));
        }

        let probabilities = softmax(scores);
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate().skip(1) {
            if *p > probabilities[best] {
                best = i;
            }
        }
        let dominant = SentimentLabel::ALL[best];
        let confidence = probabilities[best];
        let label = if confidence < threshold {
            SentimentLabel::Neutral
        } else {
            dominant
        };

        Ok(Self {
            label,
            dominant,
            confidence,
            probabilities,
        })
    }
}

/// Numerically stable softmax.
fn softmax(scores: [f32; 3]) -> [f32; 3] {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = scores.map(|s| (s - max).exp());
    let sum: f32 = exps.iter().sum();
    exps.map(|e| e / sum)
}

/// Normalizes text and classifies it with a shared [`SentimentModel`].
#[derive(Clone)]
pub struct SentimentClassifier {
    model: Arc<dyn SentimentModel>,
    threshold: f32,
}

impl SentimentClassifier {
    /// Classifier with the default confidence threshold.
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self {
            model,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Override the confidence threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Classify one utterance.
    ///
    /// The text is normalized first; an empty result is still sent to the
    /// model.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::ModelInference`] if the model fails.
    pub fn classify(&self, text: &str) -> Result<Classification> {
        let cleaned = normalize(text);
        let logits = self.model.logits(&cleaned)?;
        let classification = Classification::from_logits(&logits, self.threshold)?;
        debug!(
            label = %classification.label,
            dominant = %classification.dominant,
            confidence = classification.confidence,
            "classified utterance"
        );
        Ok(classification)
    }

    /// Classify one utterance and return only its label.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::ModelInference`] if the model fails.
    pub fn label(&self, text: &str) -> Result<SentimentLabel> {
        self.classify(text).map(|c| c.label)
    }
}

impl fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
