use serde::{Deserialize, Serialize};

use crate::foundation::error::{PosereelError, PosereelResult};
use crate::sequence::pose::{CharacterPose, MouthState, PartTransform};
use crate::sequence::track::{EventTrack, TimedEvent};

/// Audio cue carried by a sound event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    /// Blob uri of the encoded audio source.
    pub source_uri: String,
    /// Linear gain applied to the clip.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

/// A named collection of independent event tracks over local time `[0, duration_sec)`.
///
/// Tracks are sampled independently as step functions. Sound events are scheduled by the audio
/// pipeline and do not contribute to the visual pose.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PosableCharacterSequence {
    /// Library key or descriptive name.
    pub id: String,
    /// Local length of the sequence.
    pub duration_sec: f64,
    /// Mouth shape.
    #[serde(default)]
    pub mouth: EventTrack<MouthState>,
    /// Left eye open/closed.
    #[serde(default)]
    pub left_eye_open: EventTrack<bool>,
    /// Right eye open/closed.
    #[serde(default)]
    pub right_eye_open: EventTrack<bool>,
    /// Left hand transform.
    #[serde(default)]
    pub left_hand_transform: EventTrack<PartTransform>,
    /// Right hand transform.
    #[serde(default)]
    pub right_hand_transform: EventTrack<PartTransform>,
    /// Surface line vertical offset.
    #[serde(default)]
    pub surface_line_offset: EventTrack<f64>,
    /// Mask boundary offset from the character bottom.
    #[serde(default)]
    pub mask_boundary_offset: EventTrack<f64>,
    /// Surface line visibility.
    #[serde(default)]
    pub surface_line_visible: EventTrack<bool>,
    /// Head masking.
    #[serde(default)]
    pub head_masking_enabled: EventTrack<bool>,
    /// Left hand masking.
    #[serde(default)]
    pub left_hand_masking_enabled: EventTrack<bool>,
    /// Right hand masking.
    #[serde(default)]
    pub right_hand_masking_enabled: EventTrack<bool>,
    /// Scheduled audio cues.
    #[serde(default)]
    pub sound_events: EventTrack<SoundCue>,
}

impl PosableCharacterSequence {
    /// Sequence with no events: every sample is the default pose.
    pub fn idle(id: impl Into<String>, duration_sec: f64) -> Self {
        Self {
            id: id.into(),
            duration_sec,
            ..Self::default()
        }
    }

    /// Sequence that keeps a character of `character_height_px` fully masked for its duration.
    pub fn hidden(
        id: impl Into<String>,
        duration_sec: f64,
        character_height_px: f64,
    ) -> PosereelResult<Self> {
        let all = || EventTrack::new(vec![TimedEvent::new(0.0, duration_sec, true)]);
        Ok(Self {
            id: id.into(),
            duration_sec,
            mask_boundary_offset: EventTrack::new(vec![TimedEvent::new(
                0.0,
                duration_sec,
                -character_height_px,
            )])?,
            head_masking_enabled: all()?,
            left_hand_masking_enabled: all()?,
            right_hand_masking_enabled: all()?,
            ..Self::default()
        })
    }

    /// Check the duration and that every event ends inside the sequence.
    pub fn validate(&self) -> PosereelResult<()> {
        if !self.duration_sec.is_finite() || self.duration_sec <= 0.0 {
            return Err(PosereelError::validation(format!(
                "sequence '{}' duration must be finite and > 0",
                self.id
            )));
        }
        let ends = [
            ("mouth", self.mouth.end_sec()),
            ("left_eye_open", self.left_eye_open.end_sec()),
            ("right_eye_open", self.right_eye_open.end_sec()),
            ("left_hand_transform", self.left_hand_transform.end_sec()),
            ("right_hand_transform", self.right_hand_transform.end_sec()),
            ("surface_line_offset", self.surface_line_offset.end_sec()),
            ("mask_boundary_offset", self.mask_boundary_offset.end_sec()),
            ("surface_line_visible", self.surface_line_visible.end_sec()),
            ("head_masking_enabled", self.head_masking_enabled.end_sec()),
            (
                "left_hand_masking_enabled",
                self.left_hand_masking_enabled.end_sec(),
            ),
            (
                "right_hand_masking_enabled",
                self.right_hand_masking_enabled.end_sec(),
            ),
            ("sound_events", self.sound_events.end_sec()),
        ];
        for (name, end) in ends {
            if end > self.duration_sec {
                return Err(PosereelError::validation(format!(
                    "sequence '{}' track '{name}' ends at {end}s, past its duration {}s",
                    self.id, self.duration_sec
                )));
            }
        }
        Ok(())
    }

    /// Sample every visual track at `local_time`, falling back to [`CharacterPose::DEFAULT`].
    pub fn sample_pose(&self, local_time: f64) -> CharacterPose {
        let d = CharacterPose::DEFAULT;
        CharacterPose {
            mouth: self.mouth.sample(local_time).copied().unwrap_or(d.mouth),
            left_eye_open: self
                .left_eye_open
                .sample(local_time)
                .copied()
                .unwrap_or(d.left_eye_open),
            right_eye_open: self
                .right_eye_open
                .sample(local_time)
                .copied()
                .unwrap_or(d.right_eye_open),
            left_hand: self
                .left_hand_transform
                .sample(local_time)
                .copied()
                .unwrap_or(d.left_hand),
            right_hand: self
                .right_hand_transform
                .sample(local_time)
                .copied()
                .unwrap_or(d.right_hand),
            surface_line_offset: self
                .surface_line_offset
                .sample(local_time)
                .copied()
                .unwrap_or(d.surface_line_offset),
            mask_boundary_offset: self
                .mask_boundary_offset
                .sample(local_time)
                .copied()
                .unwrap_or(d.mask_boundary_offset),
            surface_line_visible: self
                .surface_line_visible
                .sample(local_time)
                .copied()
                .unwrap_or(d.surface_line_visible),
            head_masking_enabled: self
                .head_masking_enabled
                .sample(local_time)
                .copied()
                .unwrap_or(d.head_masking_enabled),
            left_hand_masking_enabled: self
                .left_hand_masking_enabled
                .sample(local_time)
                .copied()
                .unwrap_or(d.left_hand_masking_enabled),
            right_hand_masking_enabled: self
                .right_hand_masking_enabled
                .sample(local_time)
                .copied()
                .unwrap_or(d.right_hand_masking_enabled),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/posable.rs"]
mod tests;
