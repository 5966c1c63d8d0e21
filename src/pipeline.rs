//! The per-utterance reply pipeline.
//!
//! Stages run strictly in order: classify → build prompt → generate reply →
//! optionally speak. Only an empty utterance or a classifier failure makes a
//! request fail; later stages fold their problems into the response.

use crate::error::{ClarityError, Result};
use crate::llm::ReplyGenerator;
use crate::prompt::build_prompt;
use crate::sentiment::{Classification, SentimentClassifier, SentimentLabel};
use crate::speech::SpeechRenderer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub reply: String,
    pub sentiment: SentimentLabel,
    /// Set when speaking the reply failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak_note: Option<String>,
}

/// Shared, read-only pipeline context built once at startup.
#[derive(Debug, Clone)]
pub struct ChatPipeline {
    classifier: SentimentClassifier,
    generator: ReplyGenerator,
    speech: Option<SpeechRenderer>,
}

impl ChatPipeline {
    pub fn new(classifier: SentimentClassifier, generator: ReplyGenerator) -> Self {
        Self {
            classifier,
            generator,
            speech: None,
        }
    }

    /// Speak every reply through `speech`.
    #[must_use]
    pub fn with_speech(mut self, speech: SpeechRenderer) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech.is_some()
    }

    /// Let detached spoken replies finish before shutdown.
    pub async fn drain_speech(&self) {
        if let Some(speech) = &self.speech {
            speech.drain().await;
        }
    }

    /// Classify `text` on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::ModelInference`] if the model fails.
    pub async fn classify(&self, text: &str) -> Result<Classification> {
        let classifier = self.classifier.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || classifier.classify(&text))
            .await
            .map_err(|e| ClarityError::ModelInference(format!("classifier task failed: {e}")))?
    }

    /// Run the full pipeline for one utterance.
    ///
    /// # Errors
    ///
    /// - [`ClarityError::EmptyInput`] if `user_text` is blank; nothing else
    ///   runs.
    /// - [`ClarityError::ModelInference`] if classification fails; no reply
    ///   is generated.
    pub async fn respond(&self, user_text: &str) -> Result<ResponseEnvelope> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(ClarityError::EmptyInput);
        }

        let classification = self.classify(user_text).await?;
        let sentiment = classification.label;

        let prompt = build_prompt(user_text, sentiment);
        debug!(prompt_chars = prompt.chars().count(), "built prompt");

        let reply = self.generator.generate_reply(&prompt).await;

        let speak_note = match &self.speech {
            Some(speech) => speech.speak(&reply).await,
            None => None,
        };

        info!(
            %sentiment,
            confidence = classification.confidence,
            reply_chars = reply.chars().count(),
            speak_failed = speak_note.is_some(),
            "reply ready"
        );

        Ok(ResponseEnvelope {
            reply,
            sentiment,
            speak_note,
        })
    }
}
