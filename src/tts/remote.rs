//! OpenAI-compatible `/v1/audio/speech` synthesizer.

use super::{SpeechSynthesizer, SynthesizedSpeech};
use crate::config::{AudioFormat, SpeechConfig};
use crate::error::{ClarityError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Remote synthesizer for any server implementing the OpenAI speech API.
pub struct RemoteTts {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
    speed: f32,
    format: AudioFormat,
}

impl RemoteTts {
    /// Build a synthesizer from config, resolving the API key.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Config`] if the key reference cannot be
    /// resolved and [`ClarityError::Tts`] if the HTTP client cannot be built.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let api_key = config.api_key.resolve()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClarityError::Tts(format!("failed to build HTTP client: {e}")))?;

        let url = speech_url(&config.api_url);
        info!("speech API configured: {url} voice={}", config.voice);

        Ok(Self {
            client,
            url,
            api_key,
            model: config.model.clone(),
            voice: config.voice.clone(),
            speed: config.speed,
            format: config.format,
        })
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "speed": self.speed,
            "response_format": self.format.extension(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for RemoteTts {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedSpeech> {
        let mut request = self.client.post(&self.url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| ClarityError::Tts(format!("speech request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClarityError::Tts(format!(
                "speech API HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClarityError::Tts(format!("failed to read speech audio: {e}")))?;
        if bytes.is_empty() {
            return Err(ClarityError::Tts("speech API returned no audio".into()));
        }
        debug!("synthesized {} bytes of {:?} audio", bytes.len(), self.format);

        Ok(SynthesizedSpeech {
            bytes: bytes.to_vec(),
            format: self.format,
        })
    }
}

/// `{base}/v1/audio/speech`, tolerating a base that already ends in `/v1`.
fn speech_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/audio/speech")
}
