use serde::{Deserialize, Serialize};

use crate::foundation::core::Vec2;
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::sequence::pose::MouthState;

/// Character rig: box size plus named part-image uris.
///
/// Every part image is a layer sized to the character box and drawn at its origin; hands rotate
/// and scale about their pivots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterAssetDef {
    /// Stable character identifier.
    pub id: String,
    /// Character box width in pixels.
    pub width_px: u32,
    /// Character box height in pixels.
    pub height_px: u32,
    /// Head (and body) layer.
    pub head_uri: String,
    /// Mouth layer for [`MouthState::Closed`].
    pub mouth_closed_uri: String,
    /// Mouth layer for [`MouthState::Open`].
    pub mouth_open_uri: String,
    /// Mouth layer for [`MouthState::O`].
    pub mouth_o_uri: String,
    /// Left eye, open.
    pub left_eye_open_uri: String,
    /// Left eye, closed.
    pub left_eye_closed_uri: String,
    /// Right eye, open.
    pub right_eye_open_uri: String,
    /// Right eye, closed.
    pub right_eye_closed_uri: String,
    /// Left hand layer.
    pub left_hand_uri: String,
    /// Right hand layer.
    pub right_hand_uri: String,
    /// Optional surface line layer drawn in front of the character.
    #[serde(default)]
    pub surface_line_uri: Option<String>,
    /// Left hand pivot in character pixels; box center when absent.
    #[serde(default)]
    pub left_hand_pivot: Option<[f64; 2]>,
    /// Right hand pivot in character pixels; box center when absent.
    #[serde(default)]
    pub right_hand_pivot: Option<[f64; 2]>,
    /// Resting top edge of the surface line layer in character pixels.
    #[serde(default)]
    pub surface_line_y_px: f64,
}

impl CharacterAssetDef {
    /// Rig whose parts follow the conventional file layout under `dir`.
    ///
    /// Parts are `head.png`, `mouth_{closed,open,o}.png`, `{left,right}_eye_{open,closed}.png`
    /// and `{left,right}_hand.png`. No surface line; pivots at the box center.
    pub fn from_layout(id: impl Into<String>, width_px: u32, height_px: u32, dir: &str) -> Self {
        let dir = dir.trim_end_matches('/');
        let part = |name: &str| format!("{dir}/{name}.png");
        Self {
            id: id.into(),
            width_px,
            height_px,
            head_uri: part("head"),
            mouth_closed_uri: part("mouth_closed"),
            mouth_open_uri: part("mouth_open"),
            mouth_o_uri: part("mouth_o"),
            left_eye_open_uri: part("left_eye_open"),
            left_eye_closed_uri: part("left_eye_closed"),
            right_eye_open_uri: part("right_eye_open"),
            right_eye_closed_uri: part("right_eye_closed"),
            left_hand_uri: part("left_hand"),
            right_hand_uri: part("right_hand"),
            surface_line_uri: None,
            left_hand_pivot: None,
            right_hand_pivot: None,
            surface_line_y_px: 0.0,
        }
    }

    /// Uri of the mouth layer for `state`.
    pub fn mouth_uri(&self, state: MouthState) -> &str {
        match state {
            MouthState::Closed => &self.mouth_closed_uri,
            MouthState::Open => &self.mouth_open_uri,
            MouthState::O => &self.mouth_o_uri,
        }
    }

    /// Uri of the left eye layer.
    pub fn left_eye_uri(&self, open: bool) -> &str {
        if open {
            &self.left_eye_open_uri
        } else {
            &self.left_eye_closed_uri
        }
    }

    /// Uri of the right eye layer.
    pub fn right_eye_uri(&self, open: bool) -> &str {
        if open {
            &self.right_eye_open_uri
        } else {
            &self.right_eye_closed_uri
        }
    }

    /// Left hand pivot.
    pub fn left_pivot(&self) -> Vec2 {
        self.left_hand_pivot
            .map(|[x, y]| Vec2::new(x, y))
            .unwrap_or_else(|| self.center())
    }

    /// Right hand pivot.
    pub fn right_pivot(&self) -> Vec2 {
        self.right_hand_pivot
            .map(|[x, y]| Vec2::new(x, y))
            .unwrap_or_else(|| self.center())
    }

    fn center(&self) -> Vec2 {
        Vec2::new(
            f64::from(self.width_px) * 0.5,
            f64::from(self.height_px) * 0.5,
        )
    }

    /// All distinct part uris, in draw order.
    pub fn part_uris(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![
            &self.head_uri,
            &self.left_eye_open_uri,
            &self.left_eye_closed_uri,
            &self.right_eye_open_uri,
            &self.right_eye_closed_uri,
            &self.mouth_closed_uri,
            &self.mouth_open_uri,
            &self.mouth_o_uri,
            &self.left_hand_uri,
            &self.right_hand_uri,
        ];
        if let Some(line) = &self.surface_line_uri {
            out.push(line);
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|u| seen.insert(*u));
        out
    }

    /// Reject empty boxes.
    pub fn validate(&self) -> PosereelResult<()> {
        if self.width_px == 0 || self.height_px == 0 {
            return Err(PosereelError::validation(format!(
                "character '{}' must have a non-empty box",
                self.id
            )));
        }
        Ok(())
    }
}
