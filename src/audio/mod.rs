//! Decoding and host playback of synthesized speech.

pub mod decode;
pub mod playback;

pub use playback::CpalSink;

use crate::error::Result;
use std::path::Path;

/// Something that can play an encoded audio file to completion.
///
/// `play_file` blocks until playback has finished; async callers should run
/// it on a blocking thread.
pub trait AudioSink: Send + Sync {
    /// Play the file at `path`, returning once it has been heard in full.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClarityError::Audio`] if the file cannot be decoded
    /// or no output device is usable.
    fn play_file(&self, path: &Path) -> Result<()>;
}
