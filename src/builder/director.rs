use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::character::asset::CharacterAssetDef;
use crate::character::voice::Voice;
use crate::foundation::core::{Canvas, SceneRect, TimeWindow};
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::scene::model::{
    FitMode, SceneScript, SubtitleEntry, SubtitleStyle, SubtitleTrack, TimedCharacterSequence,
    TimedImage, TimedItem,
};
use crate::sequence::library::SequenceLibrary;
use crate::sequence::posable::PosableCharacterSequence;

/// Timing and layout knobs of [`ScriptBuilder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptBuilderOpts {
    /// Share of the canvas height given to the top banner.
    pub banner_fraction: f64,
    /// Library key of the entrance sequence.
    pub pop_in_sequence_id: String,
    /// Delay between one entrance ending and the next listener's pop-in.
    pub listener_pop_in_delay_sec: f64,
    /// Minimum pause between consecutive turns.
    pub turn_gap_sec: f64,
    /// Delay from the final turn's end to the reactions.
    pub reaction_offset_sec: f64,
    /// Time kept after the last item ends.
    pub tail_sec: f64,
    /// z index of the first actor; later actors stack above it.
    pub actor_z_base: i32,
    /// Share of the stage height used by the subtitle area.
    pub subtitle_height_fraction: f64,
    /// Caption style; no subtitles are produced when absent.
    pub subtitle_style: Option<SubtitleStyle>,
}

impl Default for ScriptBuilderOpts {
    fn default() -> Self {
        Self {
            banner_fraction: 0.3,
            pop_in_sequence_id: "pop_in".to_string(),
            listener_pop_in_delay_sec: 0.3,
            turn_gap_sec: 0.25,
            reaction_offset_sec: 0.2,
            tail_sec: 0.5,
            actor_z_base: 10,
            subtitle_height_fraction: 0.2,
            subtitle_style: None,
        }
    }
}

/// Banner images: the setup shows until the final turn, then the punchline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePair {
    /// Blob uri shown first.
    pub setup_uri: String,
    /// Blob uri shown from the final turn on.
    pub punchline_uri: String,
}

/// One performer in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Stable actor identity.
    pub actor_id: String,
    /// Rig to draw.
    pub character: CharacterAssetDef,
    /// Voice, which selects the reaction sequence.
    pub voice: Voice,
}

/// One spoken line with its pre-built animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    /// Speaking actor.
    pub actor_id: String,
    /// Animation (and sound) of the line.
    pub sequence: PosableCharacterSequence,
    /// Caption text.
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Raw material for one scene. The first actor is the teller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneContent {
    /// Output size.
    pub canvas: Canvas,
    /// Banner images.
    pub images: ImagePair,
    /// Stage background.
    pub background_uri: String,
    /// Performers; at least one.
    pub actors: Vec<ActorSpec>,
    /// Lines in speaking order; at least one.
    pub turns: Vec<DialogueTurn>,
}

/// Output of [`ScriptBuilder::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltScene {
    /// The validated script.
    pub script: SceneScript,
    /// Where each turn was placed, in turn order.
    pub turn_windows: Vec<TimeWindow>,
}

struct Placed {
    window: TimeWindow,
    sequence: PosableCharacterSequence,
}

struct ActorTimeline<'a> {
    spec: &'a ActorSpec,
    placed: Vec<Placed>,
}

impl ActorTimeline<'_> {
    fn ready_at(&self) -> f64 {
        self.placed.last().map(|p| p.window.end_sec).unwrap_or(0.0)
    }

    fn place(&mut self, start_sec: f64, sequence: PosableCharacterSequence) -> TimeWindow {
        let window = TimeWindow::new(start_sec, start_sec + sequence.duration_sec);
        self.placed.push(Placed { window, sequence });
        window
    }
}

/// Turns raw dialogue content into a complete, valid [`SceneScript`].
pub struct ScriptBuilder {
    library: Arc<dyn SequenceLibrary>,
    opts: ScriptBuilderOpts,
}

impl ScriptBuilder {
    /// Builder drawing entrance and reaction sequences from `library`.
    pub fn new(library: Arc<dyn SequenceLibrary>, opts: ScriptBuilderOpts) -> Self {
        Self { library, opts }
    }

    /// Lay out entrances, turns, reactions, fillers, backgrounds and subtitles.
    #[tracing::instrument(
        skip_all,
        fields(actors = content.actors.len(), turns = content.turns.len())
    )]
    pub fn build(&self, content: &SceneContent) -> PosereelResult<BuiltScene> {
        self.check_content(content)?;
        let o = &self.opts;

        let mut timelines: Vec<ActorTimeline<'_>> = content
            .actors
            .iter()
            .map(|spec| ActorTimeline {
                spec,
                placed: Vec::new(),
            })
            .collect();
        let index: BTreeMap<&str, usize> = content
            .actors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.actor_id.as_str(), i))
            .collect();

        // Entrances: teller at 0, each listener a fixed delay after the previous entrance.
        let pop_in = self.library.get_sequence(&o.pop_in_sequence_id)?;
        let mut prev_entrance_end: Option<f64> = None;
        for tl in &mut timelines {
            let start = prev_entrance_end
                .map(|end| end + o.listener_pop_in_delay_sec)
                .unwrap_or(0.0);
            prev_entrance_end = Some(tl.place(start, pop_in.clone()).end_sec);
        }

        let mut turn_windows = Vec::with_capacity(content.turns.len());
        let mut prev_turn_end: Option<f64> = None;
        for turn in &content.turns {
            let slot = index
                .get(turn.actor_id.as_str())
                .copied()
                .ok_or_else(|| {
                    PosereelError::validation(format!("unknown actor '{}'", turn.actor_id))
                })?;
            let tl = &mut timelines[slot];
            let earliest = prev_turn_end
                .map(|end| end + o.turn_gap_sec)
                .unwrap_or(0.0);
            let start = earliest.max(tl.ready_at());
            let window = tl.place(start, turn.sequence.clone());
            prev_turn_end = Some(window.end_sec);
            turn_windows.push(window);
        }
        let (final_turn_start, t_end) = match turn_windows.last() {
            Some(w) => (w.start_sec, w.end_sec),
            None => return Err(PosereelError::validation("scene needs at least one turn")),
        };

        for tl in &mut timelines {
            let reaction = self
                .library
                .get_sequence(&tl.spec.voice.reaction_sequence_id())?;
            let start = (t_end + o.reaction_offset_sec).max(tl.ready_at());
            tl.place(start, reaction);
        }

        let last_end = timelines
            .iter()
            .map(|tl| tl.ready_at())
            .fold(t_end, f64::max);
        let duration_sec = last_end + o.tail_sec;

        let layout = StageLayout::new(content.canvas, o.banner_fraction, content.actors.len());
        let mut items = background_items(content, &layout, final_turn_start, duration_sec);
        for (i, tl) in timelines.iter().enumerate() {
            let z_index = o.actor_z_base + i as i32;
            let rect = layout.actor_rect(i);
            for (window, sequence) in fill_gaps(tl, duration_sec)? {
                items.push(TimedItem::CharacterSequence(TimedCharacterSequence {
                    start_time_sec: window.start_sec,
                    end_time_sec: window.end_sec,
                    z_index,
                    rect,
                    actor_id: tl.spec.actor_id.clone(),
                    character: tl.spec.character.clone(),
                    sequence,
                }));
            }
        }

        let subtitles = o.subtitle_style.as_ref().map(|style| SubtitleTrack {
            rect: layout.subtitle_rect(o.subtitle_height_fraction),
            style: style.clone(),
            entries: content
                .turns
                .iter()
                .zip(&turn_windows)
                .filter_map(|(turn, w)| {
                    let text = turn.transcript.as_deref()?.trim();
                    (!text.is_empty()).then(|| SubtitleEntry {
                        start_sec: w.start_sec,
                        end_sec: w.end_sec,
                        text: text.to_string(),
                    })
                })
                .collect(),
        });

        let script = SceneScript {
            canvas: content.canvas,
            items,
            duration_sec,
            subtitles,
        };
        script.validate()?;
        tracing::debug!(duration_sec, items = script.items.len(), "scene built");
        Ok(BuiltScene {
            script,
            turn_windows,
        })
    }

    fn check_content(&self, content: &SceneContent) -> PosereelResult<()> {
        if content.canvas.width == 0 || content.canvas.height == 0 {
            return Err(PosereelError::validation("canvas must be non-empty"));
        }
        if content.actors.is_empty() {
            return Err(PosereelError::validation("scene needs at least one actor"));
        }
        if content.turns.is_empty() {
            return Err(PosereelError::validation("scene needs at least one turn"));
        }
        if !(0.0..1.0).contains(&self.opts.banner_fraction) {
            return Err(PosereelError::configuration(
                "banner_fraction must be in [0, 1)",
            ));
        }
        let mut ids = HashSet::new();
        for a in &content.actors {
            if !ids.insert(a.actor_id.as_str()) {
                return Err(PosereelError::validation(format!(
                    "duplicate actor id '{}'",
                    a.actor_id
                )));
            }
            a.character.validate()?;
        }
        for (i, t) in content.turns.iter().enumerate() {
            if !ids.contains(t.actor_id.as_str()) {
                return Err(PosereelError::validation(format!(
                    "turn {i} names unknown actor '{}'",
                    t.actor_id
                )));
            }
            t.sequence.validate()?;
        }
        Ok(())
    }
}

/// Pad an actor's placed items so they chain exactly over `[0, duration_sec)`.
///
/// Time before the first entrance is hidden; every other gap idles.
fn fill_gaps(
    tl: &ActorTimeline<'_>,
    duration_sec: f64,
) -> PosereelResult<Vec<(TimeWindow, PosableCharacterSequence)>> {
    let height = f64::from(tl.spec.character.height_px);
    let mut out = Vec::with_capacity(tl.placed.len() * 2 + 1);
    let mut cursor = 0.0;
    for p in &tl.placed {
        if p.window.start_sec > cursor {
            let len = p.window.start_sec - cursor;
            let filler = if out.is_empty() {
                PosableCharacterSequence::hidden("filler_hidden", len, height)?
            } else {
                PosableCharacterSequence::idle("filler_idle", len)
            };
            out.push((TimeWindow::new(cursor, p.window.start_sec), filler));
        }
        out.push((p.window, p.sequence.clone()));
        cursor = p.window.end_sec;
    }
    if duration_sec > cursor {
        out.push((
            TimeWindow::new(cursor, duration_sec),
            PosableCharacterSequence::idle("filler_idle", duration_sec - cursor),
        ));
    }
    Ok(out)
}

/// Banner on top, stage below, actors side by side on the stage.
struct StageLayout {
    banner: SceneRect,
    stage: SceneRect,
    actors: usize,
}

impl StageLayout {
    fn new(canvas: Canvas, banner_fraction: f64, actors: usize) -> Self {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let banner_h = (h * banner_fraction).round();
        Self {
            banner: SceneRect::new(0.0, 0.0, w, banner_h),
            stage: SceneRect::new(0.0, banner_h, w, h - banner_h),
            actors: actors.max(1),
        }
    }

    fn actor_rect(&self, i: usize) -> SceneRect {
        let slot_w = self.stage.width_px / self.actors as f64;
        SceneRect::new(
            self.stage.x_px + slot_w * i as f64,
            self.stage.y_px,
            slot_w,
            self.stage.height_px,
        )
    }

    fn subtitle_rect(&self, fraction: f64) -> SceneRect {
        let h = (self.stage.height_px * fraction).round();
        SceneRect::new(
            self.stage.x_px,
            self.stage.bottom() - h,
            self.stage.width_px,
            h,
        )
    }
}

fn background_items(
    content: &SceneContent,
    layout: &StageLayout,
    punchline_at: f64,
    duration_sec: f64,
) -> Vec<TimedItem> {
    let image = |uri: &str, rect: SceneRect, start: f64, end: f64| {
        TimedItem::Image(TimedImage {
            start_time_sec: start,
            end_time_sec: end,
            z_index: 0,
            rect,
            source_uri: uri.to_string(),
            fit_mode: FitMode::Fill,
        })
    };
    let mut items = Vec::with_capacity(3);
    if layout.banner.height_px > 0.0 {
        if punchline_at > 0.0 {
            items.push(image(
                &content.images.setup_uri,
                layout.banner,
                0.0,
                punchline_at,
            ));
        }
        items.push(image(
            &content.images.punchline_uri,
            layout.banner,
            punchline_at,
            duration_sec,
        ));
    }
    items.push(image(
        &content.background_uri,
        layout.stage,
        0.0,
        duration_sec,
    ));
    items
}

#[cfg(test)]
#[path = "../../tests/unit/builder/director.rs"]
mod tests;
