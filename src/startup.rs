//! Startup initialization: resolves the sentiment model, loads it, and wires
//! the completion and speech adapters into a [`ChatPipeline`].
//!
//! Everything here runs once before the first request is served, so the
//! pipeline never downloads or loads anything mid-conversation.

use crate::audio::CpalSink;
use crate::config::ClarityConfig;
use crate::error::{ClarityError, Result};
use crate::llm::{ApiCompletion, ReplyGenerator};
use crate::models::ModelManager;
use crate::pipeline::ChatPipeline;
use crate::sentiment::SentimentClassifier;
use crate::sentiment::download::resolve_sentiment_assets;
use crate::sentiment::onnx::OnnxSentimentModel;
use crate::speech::SpeechRenderer;
use crate::tts::RemoteTts;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Download (if needed) and load the sentiment classifier.
///
/// # Errors
///
/// Returns [`ClarityError::Model`] if the model cannot be fetched or loaded.
pub async fn load_classifier(config: &ClarityConfig) -> Result<SentimentClassifier> {
    let classifier_config = config.classifier.clone();
    let model_config = config.models.clone();

    let model = tokio::task::spawn_blocking(move || -> Result<OnnxSentimentModel> {
        let started = Instant::now();
        let manager = ModelManager::new(&model_config)?;

        println!("\nChecking models...");
        let paths = resolve_sentiment_assets(&classifier_config, &manager)?;
        let model = OnnxSentimentModel::from_paths(&paths, &classifier_config)?;

        info!(
            "sentiment classifier loaded in {:.1}s",
            started.elapsed().as_secs_f64()
        );
        Ok(model)
    })
    .await
    .map_err(|e| ClarityError::Model(format!("model loading task failed: {e}")))??;

    Ok(SentimentClassifier::new(Arc::new(model))
        .with_threshold(config.classifier.confidence_threshold))
}

/// Build the speech renderer, or `None` when speech is disabled or cannot be
/// set up. Setup problems are logged, never fatal.
pub fn build_speech(config: &ClarityConfig) -> Option<SpeechRenderer> {
    if !config.speech.enabled {
        info!("spoken replies disabled");
        return None;
    }

    let synthesizer = match RemoteTts::new(&config.speech) {
        Ok(tts) => tts,
        Err(e) => {
            warn!("spoken replies unavailable: {e}");
            return None;
        }
    };

    let sink = CpalSink::new(&config.audio);
    match sink.check_device() {
        Ok(name) => info!("using output device: {name}"),
        Err(e) => warn!("audio output not ready, replies may not be spoken: {e}"),
    }

    Some(SpeechRenderer::new(
        Arc::new(synthesizer),
        Arc::new(sink),
        config.speech.playback,
    ))
}

/// Build the full pipeline from config.
///
/// # Errors
///
/// Returns an error if the config is invalid, the classifier cannot be
/// loaded, or the completion client cannot be built.
pub async fn initialize_pipeline(config: &ClarityConfig) -> Result<ChatPipeline> {
    config.validate()?;

    let completion = ApiCompletion::new(&config.llm)?;
    let classifier = load_classifier(config).await?;

    let mut pipeline = ChatPipeline::new(classifier, ReplyGenerator::new(Arc::new(completion)));
    if let Some(speech) = build_speech(config) {
        pipeline = pipeline.with_speech(speech);
    }

    info!(
        "pipeline ready (threshold={}, speech={})",
        config.classifier.confidence_threshold,
        pipeline.speech_enabled()
    );
    Ok(pipeline)
}
