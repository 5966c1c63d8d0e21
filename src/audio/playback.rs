//! Audio playback to system speakers via cpal.

use super::AudioSink;
use super::decode::{decode_to_mono, resample_linear_mono};
use crate::config::AudioConfig;
use crate::error::{ClarityError, Result};
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Slack on top of the clip length for device latency and start-up.
const PLAYBACK_MARGIN: Duration = Duration::from_secs(2);

/// [`AudioSink`] that plays through a cpal output device.
///
/// The device is opened per playback so a sink can outlive device changes
/// and be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct CpalSink {
    output_device: Option<String>,
}

impl CpalSink {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            output_device: config.output_device.clone(),
        }
    }

    /// Fail early if the configured (or default) device is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Audio`] if no matching device exists.
    pub fn check_device(&self) -> Result<String> {
        let device = self.open_device()?;
        Ok(device_name(&device))
    }

    fn open_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();

        if let Some(ref name) = self.output_device {
            host.output_devices()
                .map_err(|e| ClarityError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .is_some_and(|desc| desc.name() == name)
                })
                .ok_or_else(|| ClarityError::Audio(format!("output device '{name}' not found")))
        } else {
            host.default_output_device()
                .ok_or_else(|| ClarityError::Audio("no default output device".into()))
        }
    }

    /// Play mono samples, blocking until the last one has been written.
    ///
    /// Samples are resampled to the device's native rate and copied to every
    /// output channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClarityError::Audio`] if the stream cannot be built or
    /// started, reports an error while playing, or does not drain within the
    /// clip length plus a short margin.
    pub fn play_samples(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = self.open_device()?;
        let default_config = device
            .default_output_config()
            .map_err(|e| ClarityError::Audio(format!("no default output config: {e}")))?;
        let native_rate = default_config.sample_rate();
        let channels = default_config.channels();

        debug!(
            "playing {} samples on {} ({native_rate} Hz, {channels} ch)",
            samples.len(),
            device_name(&device)
        );

        let stream_config = StreamConfig {
            channels,
            sample_rate: native_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let resampled = resample_linear_mono(samples, sample_rate, native_rate);
        let deadline = clip_duration(resampled.len(), native_rate) + PLAYBACK_MARGIN;
        let buffer = Arc::new(Mutex::new(PlaybackBuffer {
            samples: resampled,
            position: 0,
            finished: false,
        }));
        let buffer_clone = Arc::clone(&buffer);
        let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let stream_error_clone = Arc::clone(&stream_error);
        let frame_width = usize::from(channels.max(1));

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let Ok(mut buf) = buffer_clone.lock() else {
                        return;
                    };
                    for frame in data.chunks_mut(frame_width) {
                        let sample = buf.next_sample();
                        frame.fill(sample);
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                    if let Ok(mut slot) = stream_error_clone.lock()
                        && slot.is_none()
                    {
                        *slot = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|e| ClarityError::Audio(format!("failed to build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| ClarityError::Audio(format!("failed to start output stream: {e}")))?;

        let waited = wait_until_drained(&buffer, &stream_error, deadline);
        drop(stream);
        waited
    }

    /// List available output devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| ClarityError::Audio(format!("cannot enumerate devices: {e}")))?;

        Ok(devices
            .filter_map(|d| d.description().ok().map(|desc| desc.name().to_owned()))
            .collect())
    }
}

impl AudioSink for CpalSink {
    fn play_file(&self, path: &Path) -> Result<()> {
        let (samples, sample_rate) = decode_to_mono(path)?;
        self.play_samples(&samples, sample_rate)
    }
}

fn device_name(device: &cpal::Device) -> String {
    device
        .description()
        .map(|d| d.name().to_owned())
        .unwrap_or_else(|_| "<unknown>".into())
}

fn clip_duration(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_secs_f64(samples as f64 / f64::from(sample_rate.max(1)))
}

/// Poll until the output callback has consumed the buffer.
///
/// Gives up on a reported stream error or once `deadline` has elapsed, so a
/// vanished device cannot block the caller forever.
fn wait_until_drained(
    buffer: &Mutex<PlaybackBuffer>,
    stream_error: &Mutex<Option<String>>,
    deadline: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        std::thread::sleep(Duration::from_millis(10));

        let reported = stream_error
            .lock()
            .map_err(|e| ClarityError::Audio(format!("stream error lock poisoned: {e}")))?
            .clone();
        if let Some(err) = reported {
            return Err(ClarityError::Audio(format!("output stream failed: {err}")));
        }

        let buf = buffer
            .lock()
            .map_err(|e| ClarityError::Audio(format!("playback buffer lock poisoned: {e}")))?;
        if buf.finished {
            return Ok(());
        }
        if started.elapsed() >= deadline {
            return Err(ClarityError::Audio(format!(
                "playback stalled at {}/{} samples after {:.1}s",
                buf.position,
                buf.samples.len(),
                deadline.as_secs_f64()
            )));
        }
    }
}

/// Playback progress shared with the output callback.
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

impl PlaybackBuffer {
    /// Next sample, or silence once the buffer is exhausted.
    fn next_sample(&mut self) -> f32 {
        match self.samples.get(self.position) {
            Some(&s) => {
                self.position += 1;
                s
            }
            None => {
                self.finished = true;
                0.0
            }
        }
    }
}
