use crate::assets::decode::{PreparedImage, resize_premul};
use crate::foundation::core::Vec2;
use crate::foundation::error::{PosereelError, PosereelResult};

/// Result of fitting a source size inside a logical box with aspect preserved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainPlacement {
    /// Top-left corner of the logical box.
    pub origin: Vec2,
    /// Offset of the scaled raster from `origin`.
    pub offset: Vec2,
    /// Uniform scale applied to the source.
    pub scale: f64,
    /// Scaled width in whole pixels.
    pub width_px: u32,
    /// Scaled height in whole pixels.
    pub height_px: u32,
}

impl ContainPlacement {
    /// Absolute top-left of the scaled raster.
    pub fn top_left(&self) -> Vec2 {
        self.origin + self.offset
    }
}

/// Uniform scale that fits `src_w x src_h` inside `logical_w x logical_h`, centered.
///
/// Fails with a configuration error when the logical size is not positive and finite, or the
/// source is empty.
pub fn contain_placement(
    src_w: u32,
    src_h: u32,
    origin: Vec2,
    logical_w: f64,
    logical_h: f64,
) -> PosereelResult<ContainPlacement> {
    if !(logical_w.is_finite() && logical_h.is_finite()) || logical_w <= 0.0 || logical_h <= 0.0 {
        return Err(PosereelError::configuration(format!(
            "contain target must be > 0, got {logical_w}x{logical_h}"
        )));
    }
    if src_w == 0 || src_h == 0 {
        return Err(PosereelError::configuration(
            "contain source must have non-zero size",
        ));
    }
    let sw = f64::from(src_w);
    let sh = f64::from(src_h);
    let scale = (logical_w / sw).min(logical_h / sh);
    let width_px = ((sw * scale).round() as u32).max(1);
    let height_px = ((sh * scale).round() as u32).max(1);
    let offset = Vec2::new(
        (logical_w - f64::from(width_px)) * 0.5,
        (logical_h - f64::from(height_px)) * 0.5,
    );
    Ok(ContainPlacement {
        origin,
        offset,
        scale,
        width_px,
        height_px,
    })
}

/// Scale `image` to fit the logical box, returning the scaled raster and its offset from `origin`.
pub fn scale_to_contain(
    image: &PreparedImage,
    origin: Vec2,
    logical_w: f64,
    logical_h: f64,
) -> PosereelResult<(PreparedImage, Vec2)> {
    let p = contain_placement(image.width, image.height, origin, logical_w, logical_h)?;
    let scaled = resize_premul(image, p.width_px, p.height_px)?;
    Ok((scaled, p.offset))
}

/// Stretch `image` to exactly the rect size, ignoring aspect ratio.
///
/// Sizes are rounded to whole pixels; a size that rounds to zero yields an empty raster.
pub fn fill(image: &PreparedImage, width: f64, height: f64) -> PosereelResult<PreparedImage> {
    if !(width.is_finite() && height.is_finite()) {
        return Err(PosereelError::configuration(format!(
            "fill target must be finite, got {width}x{height}"
        )));
    }
    let w = width.round().max(0.0) as u32;
    let h = height.round().max(0.0) as u32;
    resize_premul(image, w, h)
}

#[cfg(test)]
#[path = "../../tests/unit/render/fit.rs"]
mod tests;
