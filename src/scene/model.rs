use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::character::asset::CharacterAssetDef;
use crate::foundation::core::{Canvas, SceneRect, TimeWindow};
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::sequence::posable::PosableCharacterSequence;

/// How an image is mapped into its placement rect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Stretch to exactly the rect size; aspect ratio is ignored.
    #[default]
    Fill,
    /// Uniform scale to fit inside the rect, centered.
    Contain,
}

/// A still image shown on `[start_time_sec, end_time_sec)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedImage {
    /// Inclusive start.
    pub start_time_sec: f64,
    /// Exclusive end.
    pub end_time_sec: f64,
    /// Stacking order; higher draws on top.
    #[serde(default)]
    pub z_index: i32,
    /// Placement on the canvas.
    pub rect: SceneRect,
    /// Blob uri of the encoded image.
    pub source_uri: String,
    /// Fit strategy.
    #[serde(default)]
    pub fit_mode: FitMode,
}

/// One animated sequence performed by an actor on `[start_time_sec, end_time_sec)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedCharacterSequence {
    /// Inclusive start.
    pub start_time_sec: f64,
    /// Exclusive end.
    pub end_time_sec: f64,
    /// Stacking order; higher draws on top.
    #[serde(default)]
    pub z_index: i32,
    /// Placement on the canvas; the character box is contained in it.
    pub rect: SceneRect,
    /// Identity of the on-screen performer.
    pub actor_id: String,
    /// Rig drawn for this actor.
    pub character: CharacterAssetDef,
    /// Animation sampled in local time.
    pub sequence: PosableCharacterSequence,
}

/// Anything placed on the scene timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimedItem {
    /// Still image.
    Image(TimedImage),
    /// Posable character sequence.
    CharacterSequence(TimedCharacterSequence),
}

impl TimedItem {
    /// Half-open activity window.
    pub fn time_window(&self) -> TimeWindow {
        match self {
            TimedItem::Image(i) => TimeWindow::new(i.start_time_sec, i.end_time_sec),
            TimedItem::CharacterSequence(c) => TimeWindow::new(c.start_time_sec, c.end_time_sec),
        }
    }

    /// Stacking order.
    pub fn z_index(&self) -> i32 {
        match self {
            TimedItem::Image(i) => i.z_index,
            TimedItem::CharacterSequence(c) => c.z_index,
        }
    }

    /// Placement rect.
    pub fn rect(&self) -> SceneRect {
        match self {
            TimedItem::Image(i) => i.rect,
            TimedItem::CharacterSequence(c) => c.rect,
        }
    }

    /// Return `true` when `t` lies in the item's window.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.time_window().contains(t)
    }

    /// Character payload, if this is a character item.
    pub fn as_character(&self) -> Option<&TimedCharacterSequence> {
        match self {
            TimedItem::CharacterSequence(c) => Some(c),
            TimedItem::Image(_) => None,
        }
    }
}

/// Visual style of burned-in subtitles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    /// Blob uri of a TTF/OTF font.
    pub font_uri: String,
    /// Font size in pixels.
    pub size_px: f32,
    /// Straight-alpha RGBA text color.
    #[serde(default = "default_subtitle_color")]
    pub color_rgba: [u8; 4],
}

fn default_subtitle_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

/// One caption shown on `[start_sec, end_sec)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Inclusive start.
    pub start_sec: f64,
    /// Exclusive end.
    pub end_sec: f64,
    /// Caption text; wrapped at word boundaries.
    pub text: String,
}

/// Captions drawn on top of every other layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Area the caption block is centered in.
    pub rect: SceneRect,
    /// Font and color.
    pub style: SubtitleStyle,
    /// Captions, in any order.
    #[serde(default)]
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    /// First entry active at `t`.
    pub fn active_at(&self, t: f64) -> Option<&SubtitleEntry> {
        self.entries
            .iter()
            .find(|e| TimeWindow::new(e.start_sec, e.end_sec).contains(t))
    }
}

/// Declarative description of one rendered scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneScript {
    /// Output size.
    pub canvas: Canvas,
    /// Timeline items in any order.
    pub items: Vec<TimedItem>,
    /// Length of the rendered scene.
    pub duration_sec: f64,
    /// Optional burned-in captions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitleTrack>,
}

impl SceneScript {
    /// Parse and validate a script from JSON text.
    pub fn from_json_str(s: &str) -> PosereelResult<Self> {
        let script: SceneScript = serde_json::from_str(s)
            .map_err(|e| PosereelError::serde(format!("parse scene script JSON: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Parse and validate a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PosereelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PosereelError::asset(format!("open scene script '{}': {e}", path.display()))
        })?;
        let script: SceneScript = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            PosereelError::serde(format!("parse scene script '{}': {e}", path.display()))
        })?;
        script.validate()?;
        Ok(script)
    }

    /// Check item and subtitle windows and same-actor exclusivity.
    ///
    /// Fails when an item's or subtitle's window is empty, inverted or non-finite, or when two
    /// character items of one actor have intersecting half-open windows. Touching windows are
    /// allowed.
    pub fn validate(&self) -> PosereelResult<()> {
        for (idx, item) in self.items.iter().enumerate() {
            let w = item.time_window();
            if !w.is_well_formed() {
                return Err(PosereelError::validation(format!(
                    "item {idx} has invalid window [{}, {})",
                    w.start_sec, w.end_sec
                )));
            }
        }

        if let Some(track) = &self.subtitles {
            for (idx, e) in track.entries.iter().enumerate() {
                if !TimeWindow::new(e.start_sec, e.end_sec).is_well_formed() {
                    return Err(PosereelError::validation(format!(
                        "subtitle {idx} has invalid window [{}, {})",
                        e.start_sec, e.end_sec
                    )));
                }
            }
        }

        for (actor, windows) in self.actor_windows() {
            for pair in windows.windows(2) {
                let (a_idx, a) = pair[0];
                let (b_idx, b) = pair[1];
                if a.overlaps(b) {
                    return Err(PosereelError::validation(format!(
                        "actor '{actor}' items {a_idx} and {b_idx} overlap: [{}, {}) and [{}, {})",
                        a.start_sec, a.end_sec, b.start_sec, b.end_sec
                    )));
                }
            }
        }
        Ok(())
    }

    /// Character items grouped by actor, each group sorted by start.
    fn actor_windows(&self) -> BTreeMap<&str, Vec<(usize, TimeWindow)>> {
        let mut by_actor: BTreeMap<&str, Vec<(usize, TimeWindow)>> = BTreeMap::new();
        for (idx, item) in self.items.iter().enumerate() {
            if let Some(c) = item.as_character() {
                by_actor
                    .entry(c.actor_id.as_str())
                    .or_default()
                    .push((idx, item.time_window()));
            }
        }
        for windows in by_actor.values_mut() {
            windows.sort_by(|a, b| a.1.start_sec.total_cmp(&b.1.start_sec));
        }
        by_actor
    }

    /// Distinct actor ids appearing in the script.
    pub fn actor_ids(&self) -> Vec<&str> {
        self.actor_windows().into_keys().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
