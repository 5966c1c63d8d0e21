//! Configuration types for the reply pipeline and its adapters.

use crate::error::{ClarityError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default minimum probability the dominant label needs to be reported.
///
/// Below this the classifier reports `Neutral`.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.55;

/// Default limit on one speech synthesis request.
pub const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarityConfig {
    /// Sentiment classifier settings.
    pub classifier: ClassifierConfig,
    /// Completion service settings.
    pub llm: LlmConfig,
    /// Spoken reply settings.
    pub speech: SpeechConfig,
    /// Audio output settings.
    pub audio: AudioConfig,
    /// HTTP transport settings.
    pub server: ServerConfig,
    /// Model cache settings.
    pub models: ModelConfig,
}

/// Sentiment classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// HuggingFace repo holding an ONNX export of a 3-class
    /// (negative, neutral, positive) sequence classifier and its `tokenizer.json`.
    ///
    /// The default is the ONNX export of `cardiffnlp/twitter-roberta-base-sentiment-latest`,
    /// the retrained successor of `cardiffnlp/twitter-roberta-base-sentiment`. Both share
    /// the label order, but scores near `confidence_threshold` can differ between the two.
    /// Point `model_path`/`tokenizer_path` at a local export to use the older checkpoint.
    pub model_id: String,
    /// ONNX model variant: "fp32", "fp16", or "q8" / "quantized".
    pub model_variant: String,
    /// Local ONNX file. When set together with `tokenizer_path`, nothing is downloaded.
    pub model_path: Option<PathBuf>,
    /// Local `tokenizer.json`.
    pub tokenizer_path: Option<PathBuf>,
    /// Confidence below which the label is forced to `Neutral` (0.0–1.0).
    pub confidence_threshold: f32,
    /// Maximum tokens fed to the model (longer input is truncated).
    pub max_sequence_length: usize,
    /// ONNX Runtime intra-op thread count.
    pub intra_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_id: "Xenova/twitter-roberta-base-sentiment-latest".to_owned(),
            model_variant: "fp32".to_owned(),
            model_path: None,
            tokenizer_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_sequence_length: 512,
            intra_threads: 2,
        }
    }
}

/// Where an API key comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretRef {
    /// No API key (local servers).
    #[default]
    None,
    /// Inline literal key (discouraged; prefer `env`).
    Literal { value: String },
    /// Read the key from an environment variable at startup.
    Env { var: String },
}

impl SecretRef {
    /// Resolve the key.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Config`] when the referenced environment
    /// variable is missing or blank.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            Self::None => Ok(None),
            Self::Literal { value } => Ok(Some(value.clone())),
            Self::Env { var } => {
                let value = std::env::var(var).map_err(|_| {
                    ClarityError::Config(format!("API key env var is missing: {var}"))
                })?;
                if value.trim().is_empty() {
                    return Err(ClarityError::Config(format!(
                        "API key env var is empty: {var}"
                    )));
                }
                Ok(Some(value))
            }
        }
    }
}

/// Completion service configuration (any OpenAI-compatible chat API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the API. A trailing `/v1` is accepted.
    pub api_url: String,
    /// Model identifier sent with every request.
    pub api_model: String,
    /// API key reference.
    pub api_key: SecretRef,
    /// Sampling temperature. Omitted from the request when unset.
    pub temperature: Option<f64>,
    /// Maximum tokens to generate. Omitted from the request when unset.
    pub max_tokens: Option<u32>,
    /// HTTP client timeout. Unset means the request may block indefinitely.
    pub timeout_secs: Option<u64>,
    /// `HTTP-Referer` attribution header (OpenRouter).
    pub app_referer: Option<String>,
    /// `X-Title` attribution header (OpenRouter).
    pub app_title: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1".to_owned(),
            api_model: "google/gemini-2.0-flash-exp:free".to_owned(),
            api_key: SecretRef::Env {
                var: "OPENROUTER_API_KEY".to_owned(),
            },
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
            app_referer: None,
            app_title: Some("Clarity AI".to_owned()),
        }
    }
}

/// When spoken playback happens relative to returning the text reply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Play before returning; failures become the response's `speak_note`.
    #[default]
    Wait,
    /// Return immediately and play in the background; failures are only logged.
    Detached,
}

/// Encoded audio format requested from the speech API.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension (also the decoder hint).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Spoken reply configuration (OpenAI-compatible `/v1/audio/speech`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether replies are spoken on the host's speakers.
    pub enabled: bool,
    /// Whether the response waits for playback.
    pub playback: PlaybackMode,
    /// Base URL of the speech API.
    pub api_url: String,
    /// Speech model name.
    pub model: String,
    /// Voice name.
    pub voice: String,
    /// Speech speed multiplier (0.25–4.0).
    pub speed: f32,
    /// Encoded format requested from the API.
    pub format: AudioFormat,
    /// API key reference.
    pub api_key: SecretRef,
    /// HTTP client timeout for synthesis. Unset means no limit.
    pub timeout_secs: Option<u64>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            playback: PlaybackMode::default(),
            api_url: "https://api.openai.com/v1".to_owned(),
            model: "tts-1".to_owned(),
            voice: "alloy".to_owned(),
            speed: 1.0,
            format: AudioFormat::default(),
            api_key: SecretRef::Env {
                var: "OPENAI_API_KEY".to_owned(),
            },
            timeout_secs: Some(DEFAULT_SPEECH_TIMEOUT_SECS),
        }
    }
}

/// Audio output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind (0 = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// Model management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory for caching downloaded models.
    pub cache_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cache_dir: crate::app_dirs::hf_cache_dir(),
        }
    }
}

impl ClarityConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ClarityError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ClarityError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// Load from `path` if given, else from the default path when it exists,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.classifier.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ClarityError::Config(format!(
                "classifier.confidence_threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }
        let local_model =
            self.classifier.model_path.is_some() && self.classifier.tokenizer_path.is_some();
        if !local_model && self.classifier.model_id.trim().is_empty() {
            return Err(ClarityError::Config(
                "classifier.model_id is empty and no local model_path/tokenizer_path is set"
                    .to_owned(),
            ));
        }
        if self.classifier.max_sequence_length < 2 {
            return Err(ClarityError::Config(
                "classifier.max_sequence_length must be at least 2".to_owned(),
            ));
        }
        if self.llm.api_url.trim().is_empty() {
            return Err(ClarityError::Config("llm.api_url is empty".to_owned()));
        }
        if self.llm.api_model.trim().is_empty() {
            return Err(ClarityError::Config("llm.api_model is empty".to_owned()));
        }
        if self.speech.enabled {
            if self.speech.api_url.trim().is_empty() {
                return Err(ClarityError::Config("speech.api_url is empty".to_owned()));
            }
            if !(0.25..=4.0).contains(&self.speech.speed) {
                return Err(ClarityError::Config(format!(
                    "speech.speed must be within 0.25..=4.0, got {}",
                    self.speech.speed
                )));
            }
        }
        Ok(())
    }
}
