use std::sync::Arc;

use crate::actor::resolver::sample_actor_pose;
use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, TimeWindow};
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::render::fit::ContainPlacement;
use crate::render::raster::{FrameRGBA, snap};
use crate::render::sprite::CharacterSprite;
use crate::render::subtitle::SubtitleRenderer;
use crate::scene::model::{SubtitleTrack, TimedCharacterSequence};

/// Image layer already scaled to its fit.
#[derive(Clone, Debug)]
pub struct PreparedImageLayer {
    /// Activity window.
    pub window: TimeWindow,
    /// Stacking order.
    pub z_index: i32,
    /// Pixels at their final size.
    pub image: PreparedImage,
    /// Canvas position of the top-left pixel.
    pub x: i64,
    /// Canvas position of the top-left pixel.
    pub y: i64,
}

/// One character item of an actor plus its decoded rig.
#[derive(Clone, Debug)]
pub struct PreparedActorItem {
    /// The scripted item.
    pub item: Arc<TimedCharacterSequence>,
    /// Decoded parts of the item's character.
    pub sprite: Arc<CharacterSprite>,
    /// Character box contained in the item rect.
    pub placement: ContainPlacement,
}

/// Actor layer: every item of one actor, drawn across the whole timeline.
///
/// Before the first item the actor is drawn in the first item's rect, already posed. Between
/// items and after the last one it keeps the rect of the item that most recently started and
/// shows the default pose.
#[derive(Clone, Debug)]
pub struct PreparedActorLayer {
    /// Actor identity shared by all items.
    pub actor_id: String,
    items: Vec<PreparedActorItem>,
}

impl PreparedActorLayer {
    /// Group `items` of one actor; they are kept sorted by start time.
    pub fn new(actor_id: impl Into<String>, mut items: Vec<PreparedActorItem>) -> Self {
        items.sort_by(|a, b| a.item.start_time_sec.total_cmp(&b.item.start_time_sec));
        Self {
            actor_id: actor_id.into(),
            items,
        }
    }

    /// Start-sorted items.
    pub fn items(&self) -> &[PreparedActorItem] {
        &self.items
    }

    /// Item whose rect, z and rig apply at `t`.
    pub fn item_at(&self, t: f64) -> Option<&PreparedActorItem> {
        let started = self.items.partition_point(|i| i.item.start_time_sec <= t);
        self.items.get(started.saturating_sub(1))
    }

    fn render_at(&self, t: f64) -> PosereelResult<LayerRaster> {
        let Some(current) = self.item_at(t) else {
            return Err(PosereelError::validation(format!(
                "actor '{}' has no items to draw",
                self.actor_id
            )));
        };
        let sequences: Vec<&TimedCharacterSequence> =
            self.items.iter().map(|i| i.item.as_ref()).collect();
        let pose = sample_actor_pose(&sequences, t).pose;
        let p = current.placement;
        let image = current.sprite.render(&pose, p.scale, p.width_px, p.height_px)?;
        let top_left = p.top_left();
        Ok(LayerRaster {
            image,
            x: snap(top_left.x),
            y: snap(top_left.y),
        })
    }
}

/// One drawable timeline item.
#[derive(Clone, Debug)]
pub enum PreparedLayer {
    /// Still image.
    Image(PreparedImageLayer),
    /// Posed character.
    Actor(PreparedActorLayer),
}

/// A layer's pixels for one instant and where they go.
#[derive(Debug)]
pub struct LayerRaster {
    /// Premultiplied pixels.
    pub image: PreparedImage,
    /// Canvas x of the top-left pixel.
    pub x: i64,
    /// Canvas y of the top-left pixel.
    pub y: i64,
}

impl PreparedLayer {
    /// Whether the layer draws anything at `t`. Actors with items draw at every instant.
    pub fn is_active_at(&self, t: f64) -> bool {
        match self {
            PreparedLayer::Image(l) => l.window.contains(t),
            PreparedLayer::Actor(l) => !l.items.is_empty(),
        }
    }

    /// Stacking order at `t`.
    pub fn z_index_at(&self, t: f64) -> i32 {
        match self {
            PreparedLayer::Image(l) => l.z_index,
            PreparedLayer::Actor(l) => l.item_at(t).map_or(0, |i| i.item.z_index),
        }
    }

    /// Produce this layer's raster at absolute time `t`.
    pub fn render_at(&self, t: f64) -> PosereelResult<LayerRaster> {
        match self {
            PreparedLayer::Image(l) => Ok(LayerRaster {
                image: l.image.clone(),
                x: l.x,
                y: l.y,
            }),
            PreparedLayer::Actor(l) => l.render_at(t),
        }
    }
}

/// Subtitle schedule with its rasterizer.
#[derive(Clone, Debug)]
pub struct PreparedSubtitles {
    /// Entries, rect and style.
    pub track: SubtitleTrack,
    /// Rasterizer for the track's font.
    pub renderer: SubtitleRenderer,
}

/// Everything needed to render any frame of a script, with all assets decoded.
///
/// Plans are immutable, so frames may be rendered in any order and from many threads.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    /// Output size.
    pub canvas: Canvas,
    /// Scene length.
    pub duration_sec: f64,
    /// Layers in script order; an actor sits where its first item appears.
    pub layers: Vec<PreparedLayer>,
    /// Optional captions.
    pub subtitles: Option<PreparedSubtitles>,
}

impl RenderPlan {
    /// Layers active at `t`, ordered by z with script order breaking ties.
    pub fn active_layers(&self, t: f64) -> Vec<&PreparedLayer> {
        let mut active: Vec<&PreparedLayer> = self
            .layers
            .iter()
            .filter(|l| l.is_active_at(t))
            .collect();
        active.sort_by_key(|l| l.z_index_at(t));
        active
    }
}

/// Composite every layer active at `time` into a canvas-sized premultiplied frame.
///
/// Images and actors share a single z ordering; an active subtitle is drawn last.
pub fn render_frame(plan: &RenderPlan, time: f64) -> PosereelResult<FrameRGBA> {
    let mut frame = FrameRGBA::transparent(plan.canvas.width, plan.canvas.height);
    for layer in plan.active_layers(time) {
        let raster = layer.render_at(time)?;
        frame.composite_over(&raster.image, raster.x, raster.y);
    }
    if let Some(subs) = &plan.subtitles
        && let Some(entry) = subs.track.active_at(time)
    {
        subs.renderer.draw(&mut frame, &entry.text, subs.track.rect)?;
    }
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
