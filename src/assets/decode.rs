use std::sync::Arc;

use crate::foundation::error::{PosereelError, PosereelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug, PartialEq)]
/// Raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap already-premultiplied bytes.
    pub fn from_premul(width: u32, height: u32, bytes: Vec<u8>) -> PosereelResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| PosereelError::asset("image size overflow"))?;
        if bytes.len() != expected {
            return Err(PosereelError::asset(format!(
                "image byte length mismatch: got {}, expected {expected}",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
        })
    }

    /// Fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(vec![0u8; (width as usize) * (height as usize) * 4]),
        }
    }

    /// Premultiplied pixel at `(x, y)`, transparent when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = &self.rgba8_premul;
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> PosereelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PosereelError::asset(format!("failed to decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Resize a premultiplied image to exactly `width x height`.
///
/// Resampling premultiplied data keeps edges free of dark fringes.
pub(crate) fn resize_premul(
    src: &PreparedImage,
    width: u32,
    height: u32,
) -> PosereelResult<PreparedImage> {
    if width == src.width && height == src.height {
        return Ok(src.clone());
    }
    if width == 0 || height == 0 {
        return Ok(PreparedImage::transparent(width, height));
    }
    let buf = image::RgbaImage::from_raw(src.width, src.height, src.rgba8_premul.to_vec())
        .ok_or_else(|| PosereelError::asset("image buffer does not match its dimensions"))?;
    let resized = image::imageops::resize(&buf, width, height, image::imageops::FilterType::Triangle);
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(resized.into_raw()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
