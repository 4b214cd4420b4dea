use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::media::{AudioDecoder, AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::assets::store::BlobStore;
use crate::audio::schedule::AudioScheduleEntry;
use crate::foundation::error::{PosereelError, PosereelResult};

/// A decoded, trimmed and gain-scaled clip positioned on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    /// Source the samples came from.
    pub source_uri: String,
    /// Absolute start.
    pub start_sec: f64,
    /// Sample rate of `interleaved_f32`.
    pub sample_rate: u32,
    /// Channel count of `interleaved_f32`.
    pub channels: u16,
    /// Interleaved samples, already trimmed and volume-scaled.
    pub interleaved_f32: Vec<f32>,
}

impl AudioClip {
    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Playback length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Decode and trim every entry into a clip; output order matches `entries`.
///
/// Each distinct source is fetched and decoded once. A clip lasts `min(window, natural length)`:
/// shorter windows trim the source, longer ones never pad it.
pub fn build_audio_clips(
    entries: &[AudioScheduleEntry],
    store: &dyn BlobStore,
    decoder: &dyn AudioDecoder,
) -> PosereelResult<Vec<AudioClip>> {
    let mut uris: Vec<&str> = entries.iter().map(|e| e.source_uri.as_str()).collect();
    uris.sort_unstable();
    uris.dedup();

    let decoded = uris
        .par_iter()
        .map(|uri| -> PosereelResult<(String, Arc<AudioPcm>)> {
            let bytes = store.get_bytes(uri)?;
            let pcm = to_mix_layout(uri, decoder.decode(uri, &bytes)?)?;
            Ok((uri.to_string(), Arc::new(pcm)))
        })
        .collect::<PosereelResult<HashMap<_, _>>>()?;

    entries
        .par_iter()
        .map(|entry| -> PosereelResult<AudioClip> {
            let pcm = decoded.get(&entry.source_uri).ok_or_else(|| {
                PosereelError::asset(format!("audio '{}' was not decoded", entry.source_uri))
            })?;
            Ok(trim_clip(entry, pcm))
        })
        .collect()
}

/// Cut `pcm` to the entry's window and apply its volume.
pub(crate) fn trim_clip(entry: &AudioScheduleEntry, pcm: &AudioPcm) -> AudioClip {
    let window = entry.window_sec().max(0.0);
    let window_frames = (window * f64::from(pcm.sample_rate)).round() as usize;
    let frames = window_frames.min(pcm.frames());
    let channels = usize::from(pcm.channels);
    let interleaved_f32 = pcm.interleaved_f32[..frames * channels]
        .iter()
        .map(|s| s * entry.volume)
        .collect();
    AudioClip {
        source_uri: entry.source_uri.clone(),
        start_sec: entry.start_sec,
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
        interleaved_f32,
    }
}

/// Upmix mono sources and reject anything not at the mix sample rate.
fn to_mix_layout(uri: &str, pcm: AudioPcm) -> PosereelResult<AudioPcm> {
    if pcm.sample_rate != MIX_SAMPLE_RATE {
        return Err(PosereelError::asset(format!(
            "audio '{uri}' decoded at {} Hz, expected {MIX_SAMPLE_RATE} Hz",
            pcm.sample_rate
        )));
    }
    match pcm.channels {
        c if c == MIX_CHANNELS => Ok(pcm),
        1 => Ok(AudioPcm {
            sample_rate: pcm.sample_rate,
            channels: MIX_CHANNELS,
            interleaved_f32: pcm
                .interleaved_f32
                .iter()
                .flat_map(|&s| std::iter::repeat_n(s, usize::from(MIX_CHANNELS)))
                .collect(),
        }),
        c => Err(PosereelError::asset(format!(
            "audio '{uri}' has {c} channels, expected 1 or {MIX_CHANNELS}"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/clips.rs"]
mod tests;
