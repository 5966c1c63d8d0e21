//! Best-effort spoken rendering of replies.
//!
//! Synthesis and playback failures never fail a request. In
//! [`PlaybackMode::Wait`] they come back as an advisory note; in
//! [`PlaybackMode::Detached`] they are only logged.

use crate::audio::AudioSink;
use crate::config::PlaybackMode;
use crate::error::{ClarityError, Result};
use crate::tts::SpeechSynthesizer;
use std::io::Write;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Synthesizes replies and plays them one at a time.
#[derive(Clone)]
pub struct SpeechRenderer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    mode: PlaybackMode,
    playback_lock: Arc<tokio::sync::Mutex<()>>,
    background: TaskTracker,
}

impl SpeechRenderer {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        mode: PlaybackMode,
    ) -> Self {
        Self {
            synthesizer,
            sink,
            mode,
            playback_lock: Arc::new(tokio::sync::Mutex::new(())),
            background: TaskTracker::new(),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Speak `text` according to the playback mode.
    ///
    /// Returns `Some("Couldn't play audio: ...")` only when waiting for
    /// playback and it failed. Blank text is not rendered.
    pub async fn speak(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            debug!("skipping speech for blank reply");
            return None;
        }

        match self.mode {
            PlaybackMode::Wait => match self.render_and_play(text).await {
                Ok(()) => None,
                Err(e) => {
                    warn!("speech playback failed: {e}");
                    Some(format!("Couldn't play audio: {e}"))
                }
            },
            PlaybackMode::Detached => {
                let renderer = self.clone();
                let text = text.to_owned();
                self.background.spawn(async move {
                    if let Err(e) = renderer.render_and_play(&text).await {
                        warn!("background speech playback failed: {e}");
                    }
                });
                None
            }
        }
    }

    /// Wait for detached playback still in flight.
    ///
    /// Call before exiting so no temporary audio files are left behind.
    /// Speech started after this call is still tracked.
    pub async fn drain(&self) {
        if self.background.is_empty() {
            return;
        }
        info!("waiting for {} spoken replies to finish", self.background.len());
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    /// Synthesize `text`, play it to completion, then delete the audio file.
    ///
    /// Playback is serialized across callers; synthesis is not. The playback
    /// turn is held by the blocking task, so dropping this future mid-playback
    /// does not let the next reply start early.
    ///
    /// # Errors
    ///
    /// Returns the synthesis, file or playback error.
    pub async fn render_and_play(&self, text: &str) -> Result<()> {
        let speech = self.synthesizer.synthesize(text).await?;

        let mut file = tempfile::Builder::new()
            .prefix("clarity-reply-")
            .suffix(&format!(".{}", speech.format.extension()))
            .tempfile()?;
        file.as_file_mut().write_all(&speech.bytes)?;
        file.as_file_mut().flush()?;

        let turn = Arc::clone(&self.playback_lock).lock_owned().await;
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || {
            let played = sink.play_file(file.path());
            drop(file);
            drop(turn);
            played
        })
        .await
        .map_err(|e| ClarityError::Audio(format!("playback task failed: {e}")))?
    }
}

impl std::fmt::Debug for SpeechRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechRenderer")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
