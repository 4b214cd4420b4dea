//! Frame sinks.
//!
//! Sinks consume rendered frames in timeline order.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Sink trait and the in-memory sink.
pub mod sink;
