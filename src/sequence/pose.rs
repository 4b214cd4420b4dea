use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, Vec2};

/// Mouth shape selected by the mouth track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouthState {
    /// Lips together.
    #[default]
    Closed,
    /// Open, talking.
    Open,
    /// Rounded "oh" shape.
    O,
}

/// 2D transform of a body part, applied about the part's pivot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartTransform {
    /// Horizontal translation in character pixels.
    pub translate_x: f64,
    /// Vertical translation in character pixels.
    pub translate_y: f64,
    /// Clockwise rotation in degrees.
    pub rotation_deg: f64,
    /// Uniform scale factor.
    pub scale: f64,
}

impl PartTransform {
    /// No movement, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        rotation_deg: 0.0,
        scale: 1.0,
    };

    /// Affine in character space: scale and rotate about `pivot`, then translate.
    pub fn to_affine(self, pivot: Vec2) -> Affine {
        Affine::translate(Vec2::new(self.translate_x, self.translate_y))
            * Affine::translate(pivot)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale(self.scale)
            * Affine::translate(-pivot)
    }
}

impl Default for PartTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Full set of sampled visual track values describing how to draw a character at one instant.
///
/// Poses are plain values: sampling never mutates a character, so frames can be produced in any
/// order or in parallel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterPose {
    /// Mouth shape.
    pub mouth: MouthState,
    /// Left eye open.
    pub left_eye_open: bool,
    /// Right eye open.
    pub right_eye_open: bool,
    /// Left hand transform.
    pub left_hand: PartTransform,
    /// Right hand transform.
    pub right_hand: PartTransform,
    /// Vertical offset of the surface line, in character pixels.
    pub surface_line_offset: f64,
    /// Vertical offset of the mask boundary from the character's bottom edge.
    pub mask_boundary_offset: f64,
    /// Whether the surface line is drawn.
    pub surface_line_visible: bool,
    /// Whether head, eyes and mouth are clipped at the mask boundary.
    pub head_masking_enabled: bool,
    /// Whether the left hand is clipped at the mask boundary.
    pub left_hand_masking_enabled: bool,
    /// Whether the right hand is clipped at the mask boundary.
    pub right_hand_masking_enabled: bool,
}

impl CharacterPose {
    /// The single default table every track falls back to when no event covers a sample.
    pub const DEFAULT: Self = Self {
        mouth: MouthState::Closed,
        left_eye_open: true,
        right_eye_open: true,
        left_hand: PartTransform::IDENTITY,
        right_hand: PartTransform::IDENTITY,
        surface_line_offset: 0.0,
        mask_boundary_offset: 0.0,
        surface_line_visible: false,
        head_masking_enabled: false,
        left_hand_masking_enabled: false,
        right_hand_masking_enabled: false,
    };
}

impl Default for CharacterPose {
    fn default() -> Self {
        Self::DEFAULT
    }
}
