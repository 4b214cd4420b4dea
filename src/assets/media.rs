use std::io::{Read as _, Write as _};
use std::process::{Command, Stdio};

use crate::foundation::error::{PosereelError, PosereelResult};

/// Internal audio mixing sample rate used across decode/mix/encode pipeline.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Channel count of decoded and mixed audio.
pub const MIX_CHANNELS: u16 = 2;

#[derive(Clone, Debug, PartialEq)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Natural length of the decoded source in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Turns encoded audio bytes into PCM at [`MIX_SAMPLE_RATE`], [`MIX_CHANNELS`] channels.
pub trait AudioDecoder: Send + Sync {
    /// Decode `bytes` loaded from `uri`. `uri` is only used for diagnostics.
    fn decode(&self, uri: &str, bytes: &[u8]) -> PosereelResult<AudioPcm>;
}

/// Decoder that pipes source bytes through the system `ffmpeg` binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioDecoder;

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode(&self, uri: &str, bytes: &[u8]) -> PosereelResult<AudioPcm> {
        decode_audio_f32_stereo(uri, bytes, MIX_SAMPLE_RATE)
    }
}

/// Decode audio bytes to stereo interleaved `f32` PCM via `ffmpeg` stdin/stdout pipes.
pub fn decode_audio_f32_stereo(
    uri: &str,
    bytes: &[u8],
    sample_rate: u32,
) -> PosereelResult<AudioPcm> {
    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-i", "pipe:0"])
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            PosereelError::asset(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| PosereelError::asset("failed to open ffmpeg stdin (unexpected)"))?;
    let input = bytes.to_vec();
    // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us.
    let feeder = std::thread::spawn(move || -> std::io::Result<()> {
        stdin.write_all(&input)?;
        drop(stdin);
        Ok(())
    });

    let mut stdout_bytes = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_end(&mut stdout_bytes).map_err(|e| {
            PosereelError::asset(format!("failed to read ffmpeg audio output: {e}"))
        })?;
    }
    let mut stderr_bytes = Vec::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_end(&mut stderr_bytes);
    }
    let status = child
        .wait()
        .map_err(|e| PosereelError::asset(format!("failed to wait for ffmpeg: {e}")))?;
    let fed = feeder
        .join()
        .map_err(|_| PosereelError::asset("ffmpeg stdin feeder thread panicked"))?;

    if !status.success() {
        return Err(PosereelError::asset(format!(
            "ffmpeg audio decode failed for '{uri}': {}",
            String::from_utf8_lossy(&stderr_bytes).trim()
        )));
    }
    fed.map_err(|e| PosereelError::asset(format!("failed to stream '{uri}' to ffmpeg: {e}")))?;

    pcm_from_f32le(&stdout_bytes, sample_rate, MIX_CHANNELS)
}

/// Reinterpret raw little-endian `f32` bytes as interleaved PCM.
pub(crate) fn pcm_from_f32le(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> PosereelResult<AudioPcm> {
    if !bytes.len().is_multiple_of(4) {
        return Err(PosereelError::asset(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: pcm,
    })
}


// `decode_audio_f32_stereo` shells out to `ffmpeg`; it is exercised only where the binary exists.
