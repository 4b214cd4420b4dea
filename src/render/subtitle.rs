use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::assets::decode::PreparedImage;
use crate::foundation::core::SceneRect;
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::render::raster::{FrameRGBA, pixmap_dims, snap};
use crate::scene::model::SubtitleStyle;

/// Padding around a rasterized line so glyph overhang is never clipped.
const LINE_PAD_PX: f64 = 4.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Greedy word wrap.
///
/// Words are appended to the current line while `measure(line)` stays within `max_width`. A word
/// that alone exceeds the width is kept whole on its own line.
pub fn wrap_words(
    text: &str,
    max_width: f64,
    mut measure: impl FnMut(&str) -> f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Inclusive-exclusive pixel box `(x0, y0, x1, y1)` of all non-transparent pixels.
pub fn ink_bounds(image: &PreparedImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..image.height {
        for x in 0..image.width {
            if image.pixel(x, y)[3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
    }
    bounds
}

/// A rasterized line plus the rect of its ink.
#[derive(Debug)]
struct InkLine {
    image: PreparedImage,
    ink: (u32, u32, u32, u32),
}

/// Rasterized captions keyed by text and wrap width.
///
/// A caption stays on screen for many frames, so each one is laid out and rasterized once.
#[derive(Default)]
struct CaptionCache {
    entries: Mutex<HashMap<(String, u64), Arc<Vec<InkLine>>>>,
}

impl CaptionCache {
    fn get_or_build(
        &self,
        text: &str,
        max_width: f64,
        build: impl FnOnce() -> PosereelResult<Vec<InkLine>>,
    ) -> PosereelResult<Arc<Vec<InkLine>>> {
        let key = (text.to_string(), max_width.to_bits());
        if let Some(hit) = self.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        // Built outside the lock; a concurrent miss on the same caption just builds it twice.
        let lines = Arc::new(build()?);
        Ok(Arc::clone(self.lock().entry(key).or_insert(lines)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, u64), Arc<Vec<InkLine>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Subtitle text rasterizer bound to one font.
///
/// The font is parsed into shared blobs once. Layout contexts are only built on a caption cache
/// miss, and clones share the cache.
#[derive(Clone)]
pub struct SubtitleRenderer {
    font_blob: parley::fontique::Blob<u8>,
    font: vello_cpu::peniko::FontData,
    style: SubtitleStyle,
    captions: Arc<CaptionCache>,
}

impl std::fmt::Debug for SubtitleRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleRenderer")
            .field("font_bytes", &self.font_blob.data().len())
            .field("style", &self.style)
            .field("cached_captions", &self.captions.len())
            .finish_non_exhaustive()
    }
}

struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    fn new(font_blob: parley::fontique::Blob<u8>) -> PosereelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(font_blob, None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| PosereelError::asset("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PosereelError::asset("registered font family has no name"))?
            .to_string();
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        layout
    }
}

impl SubtitleRenderer {
    /// Bind a style to the bytes of its font.
    pub fn new(style: SubtitleStyle, font_bytes: Vec<u8>) -> PosereelResult<Self> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(PosereelError::validation(
                "subtitle size_px must be finite and > 0",
            ));
        }
        let font_blob = parley::fontique::Blob::from(font_bytes.clone());
        // Fail early on bytes that are not a font.
        TextLayoutEngine::new(font_blob.clone())?;
        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_blob,
            font,
            style,
            captions: Arc::new(CaptionCache::default()),
        })
    }

    fn brush(&self) -> TextBrushRgba8 {
        let [r, g, b, a] = self.style.color_rgba;
        TextBrushRgba8 { r, g, b, a }
    }

    fn rasterize_line(
        &self,
        engine: &mut TextLayoutEngine,
        text: &str,
    ) -> PosereelResult<PreparedImage> {
        let layout = engine.layout_line(text, self.style.size_px, self.brush());
        let width = (f64::from(layout.width()) + 2.0 * LINE_PAD_PX).ceil() as u32;
        let height = (f64::from(layout.height()) + 2.0 * LINE_PAD_PX).ceil() as u32;
        let (w16, h16) = pixmap_dims(width.max(1), height.max(1))?;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((LINE_PAD_PX, LINE_PAD_PX)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        PreparedImage::from_premul(
            u32::from(w16),
            u32::from(h16),
            pixmap.data_as_u8_slice().to_vec(),
        )
    }

    fn build_caption(&self, text: &str, max_width: f64) -> PosereelResult<Vec<InkLine>> {
        let mut engine = TextLayoutEngine::new(self.font_blob.clone())?;
        let size = self.style.size_px;
        let brush = self.brush();
        let lines = wrap_words(text, max_width, |candidate| {
            f64::from(engine.layout_line(candidate, size, brush).width())
        });

        let mut rendered = Vec::with_capacity(lines.len());
        for line in &lines {
            let image = self.rasterize_line(&mut engine, line)?;
            if let Some(ink) = ink_bounds(&image) {
                rendered.push(InkLine { image, ink });
            }
        }
        Ok(rendered)
    }

    /// Wrap `text` to `rect` and draw it centered onto `frame`.
    pub fn draw(&self, frame: &mut FrameRGBA, text: &str, rect: SceneRect) -> PosereelResult<()> {
        let rendered = self
            .captions
            .get_or_build(text, rect.width_px, || self.build_caption(text, rect.width_px))?;
        let line_height = f64::from(self.style.size_px) * 1.2;
        for (x, y, line) in place_lines(&rendered, rect, line_height) {
            frame.composite_over(&line.image, x, y);
        }
        Ok(())
    }
}

/// Frame positions of each line image, centering ink horizontally and the block vertically.
fn place_lines(
    lines: &[InkLine],
    rect: SceneRect,
    line_height: f64,
) -> Vec<(i64, i64, &InkLine)> {
    let block_h = line_height * lines.len() as f64;
    let (cx, _) = rect.center();
    let top = rect.y_px + (rect.height_px - block_h) * 0.5;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let (x0, _, x1, _) = line.ink;
            let ink_cx = f64::from(x0 + x1) * 0.5;
            // Vertical placement uses the line box so baselines stay evenly spaced.
            let box_cy = f64::from(line.image.height) * 0.5;
            let slot_cy = top + line_height * (i as f64 + 0.5);
            (snap(cx - ink_cx), snap(slot_cy - box_cy), line)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/subtitle.rs"]
mod tests;
