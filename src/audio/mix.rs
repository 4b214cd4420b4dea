use std::path::Path;

use crate::audio::clips::AudioClip;
use crate::foundation::error::{PosereelError, PosereelResult};

/// Mixed soundtrack of a whole scene.
#[derive(Clone, Debug, PartialEq)]
pub struct MixedAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples covering the scene duration.
    pub interleaved_f32: Vec<f32>,
}

/// Overlay all clips additively into a track of exactly `duration_sec`.
///
/// Samples before zero or past the end are dropped and the result is clamped to `[-1, 1]`.
pub fn mix_clips(
    clips: &[AudioClip],
    duration_sec: f64,
    sample_rate: u32,
    channels: u16,
) -> Vec<f32> {
    let total_frames = (duration_sec.max(0.0) * f64::from(sample_rate)).round() as usize;
    let ch = usize::from(channels);
    let mut out = vec![0.0f32; total_frames * ch];

    for clip in clips {
        let offset = (clip.start_sec * f64::from(sample_rate)).round() as i64;
        // A clip starting before zero loses its head rather than being shifted later.
        let skip = usize::try_from(0i64.saturating_sub(offset)).unwrap_or(0);
        let start = usize::try_from(offset).unwrap_or(0);
        if start >= total_frames {
            continue;
        }
        let src_ch = usize::from(clip.channels.max(1));
        let frames = clip
            .frames()
            .saturating_sub(skip)
            .min(total_frames - start);
        for f in 0..frames {
            let dst = (start + f) * ch;
            let src = (skip + f) * src_ch;
            for c in 0..ch {
                // Extra output channels repeat the last source channel.
                out[dst + c] += clip.interleaved_f32[src + c.min(src_ch - 1)];
            }
        }
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub(crate) fn write_mix_to_f32le_file(
    samples_interleaved: &[f32],
    out_path: &Path,
) -> PosereelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PosereelError::encode(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        PosereelError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
