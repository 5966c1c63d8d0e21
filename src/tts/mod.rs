//! Text-to-speech synthesis.
//!
//! Synthesizers return encoded audio (mp3 or wav); decoding and playback are
//! left to an [`AudioSink`](crate::audio::AudioSink).

mod remote;

pub use remote::RemoteTts;

use crate::config::AudioFormat;
use async_trait::async_trait;

/// Encoded audio for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Text to encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClarityError::Tts`] on any synthesis failure.
    async fn synthesize(&self, text: &str) -> crate::Result<SynthesizedSpeech>;
}
