use std::collections::HashMap;

use crate::assets::decode::PreparedImage;
use crate::character::asset::CharacterAssetDef;
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::foundation::math::premul_over_px;
use crate::render::raster::{affine_to_cpu, image_paint, pixmap_dims};
use crate::sequence::pose::CharacterPose;

#[derive(Clone)]
struct PartPaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

impl std::fmt::Debug for PartPaint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartPaint")
            .field("w", &self.w)
            .field("h", &self.h)
            .finish_non_exhaustive()
    }
}

/// One masking group: its parts are drawn together and clipped together.
struct Batch<'a> {
    parts: Vec<(&'a PartPaint, Affine)>,
    masked: bool,
}

/// A character rig with every part decoded, ready to be posed and rasterized.
#[derive(Debug)]
pub struct CharacterSprite {
    def: CharacterAssetDef,
    parts: HashMap<String, PartPaint>,
}

impl CharacterSprite {
    /// Bind decoded part images to a character definition.
    ///
    /// `images` must hold every uri in [`CharacterAssetDef::part_uris`].
    pub fn new(
        def: CharacterAssetDef,
        images: &HashMap<String, PreparedImage>,
    ) -> PosereelResult<Self> {
        def.validate()?;
        let mut parts = HashMap::new();
        for uri in def.part_uris() {
            let img = images.get(uri).ok_or_else(|| {
                PosereelError::asset(format!(
                    "character '{}' part '{uri}' was not prepared",
                    def.id
                ))
            })?;
            parts.insert(
                uri.to_string(),
                PartPaint {
                    paint: image_paint(img)?,
                    w: img.width,
                    h: img.height,
                },
            );
        }
        Ok(Self { def, parts })
    }

    /// The bound character definition.
    pub fn def(&self) -> &CharacterAssetDef {
        &self.def
    }

    fn part(&self, uri: &str) -> PosereelResult<&PartPaint> {
        self.parts
            .get(uri)
            .ok_or_else(|| PosereelError::asset(format!("missing character part '{uri}'")))
    }

    /// Rasterize the character in `pose` at a uniform `scale` into a `width x height` image.
    ///
    /// Parts draw head, eyes, mouth, hands, then the surface line. Each enabled mask clears its
    /// batch at character-space `y >= height + mask_boundary_offset`.
    pub fn render(
        &self,
        pose: &CharacterPose,
        scale: f64,
        width: u32,
        height: u32,
    ) -> PosereelResult<PreparedImage> {
        if width == 0 || height == 0 {
            return Ok(PreparedImage::transparent(width, height));
        }
        let (w16, h16) = pixmap_dims(width, height)?;
        let base = Affine::scale(scale);
        let d = &self.def;

        let head = Batch {
            parts: vec![
                (self.part(&d.head_uri)?, base),
                (self.part(d.left_eye_uri(pose.left_eye_open))?, base),
                (self.part(d.right_eye_uri(pose.right_eye_open))?, base),
                (self.part(d.mouth_uri(pose.mouth))?, base),
            ],
            masked: pose.head_masking_enabled,
        };
        let left_hand = Batch {
            parts: vec![(
                self.part(&d.left_hand_uri)?,
                base * pose.left_hand.to_affine(d.left_pivot()),
            )],
            masked: pose.left_hand_masking_enabled,
        };
        let right_hand = Batch {
            parts: vec![(
                self.part(&d.right_hand_uri)?,
                base * pose.right_hand.to_affine(d.right_pivot()),
            )],
            masked: pose.right_hand_masking_enabled,
        };
        let mut batches = vec![head, left_hand, right_hand];
        if pose.surface_line_visible
            && let Some(uri) = &d.surface_line_uri
        {
            let shift = Affine::translate(Vec2::new(
                0.0,
                d.surface_line_y_px + pose.surface_line_offset,
            ));
            batches.push(Batch {
                parts: vec![(self.part(uri)?, base * shift)],
                masked: false,
            });
        }

        let boundary_y = f64::from(d.height_px) + pose.mask_boundary_offset;
        let mut out = vec![0u8; (width as usize) * (height as usize) * 4];
        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        for batch in &batches {
            ctx.reset();
            ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            for (part, tr) in &batch.parts {
                ctx.set_transform(affine_to_cpu(*tr));
                ctx.set_paint(part.paint.clone());
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(part.w),
                    f64::from(part.h),
                ));
            }
            ctx.flush();
            pixmap.data_as_u8_slice_mut().fill(0);
            ctx.render_to_pixmap(&mut pixmap);

            let layer = pixmap.data_as_u8_slice_mut();
            if batch.masked {
                clear_below(layer, width, height, scale, boundary_y);
            }
            for (d, s) in out.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
                let px = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&px);
            }
        }
        PreparedImage::from_premul(width, height, out)
    }
}

/// Clear every row whose center lies at or below `boundary_y` in character space.
pub(crate) fn clear_below(rgba: &mut [u8], width: u32, height: u32, scale: f64, boundary_y: f64) {
    let row_bytes = width as usize * 4;
    for row in 0..height as usize {
        let char_y = (row as f64 + 0.5) / scale;
        if char_y >= boundary_y {
            rgba[row * row_bytes..].fill(0);
            break;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sprite.rs"]
mod tests;
