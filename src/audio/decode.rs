//! Compressed/container audio to mono `f32` samples via symphonia.

use crate::error::{ClarityError, Result};
use std::path::Path;

/// Decode an audio file to mono `f32` samples, returning them with the
/// file's sample rate.
///
/// Multi-channel audio is downmixed by averaging. The container is detected
/// by probing, with the file extension as a hint.
///
/// # Errors
///
/// Returns [`ClarityError::Audio`] if the file cannot be probed or decoded.
pub fn decode_to_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ClarityError::Audio(format!("failed to probe audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| ClarityError::Audio("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| ClarityError::Audio("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ClarityError::Audio(format!("failed to create decoder: {e}")))?;

    let mut out: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(ClarityError::Audio(format!("audio read error: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(ClarityError::Audio(format!("audio decode error: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let frames = decoded.frames() as u64;
        let required = usize::try_from(frames)
            .unwrap_or(usize::MAX)
            .saturating_mul(channels);

        match sample_buf.as_mut() {
            Some(b) if b.capacity() >= required => b.clear(),
            _ => sample_buf = Some(SampleBuffer::<f32>::new(frames, spec)),
        }

        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        out.extend(downmix(buf.samples(), channels));
    }

    Ok((out, sample_rate))
}

/// Average interleaved frames down to one channel.
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler for mono audio.
pub fn resample_linear_mono(input: &[f32], from_sr: u32, to_sr: u32) -> Vec<f32> {
    if input.is_empty() || from_sr == to_sr || from_sr == 0 || to_sr == 0 {
        return input.to_vec();
    }

    let ratio = f64::from(to_sr) / f64::from(from_sr);
    let out_len = ((input.len() as f64) * ratio).round() as usize;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = (i as f64) / ratio;
            let i0 = (src_pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let t = (src_pos - i0 as f64).clamp(0.0, 1.0) as f32;
            input[i0] * (1.0 - t) + input[i1] * t
        })
        .collect()
}
