use crate::foundation::error::{PosereelError, PosereelResult};

pub use kurbo::{Affine, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Target placement rectangle in canvas pixels.
///
/// Rects may extend past the canvas; drawing is clipped.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneRect {
    /// Left edge.
    pub x_px: f64,
    /// Top edge.
    pub y_px: f64,
    /// Width.
    pub width_px: f64,
    /// Height.
    pub height_px: f64,
}

impl SceneRect {
    /// Build a rect from origin and size.
    pub fn new(x_px: f64, y_px: f64, width_px: f64, height_px: f64) -> Self {
        Self {
            x_px,
            y_px,
            width_px,
            height_px,
        }
    }

    /// Rect covering the full canvas.
    pub fn full(canvas: Canvas) -> Self {
        Self::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height))
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> f64 {
        self.x_px + self.width_px
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> f64 {
        self.y_px + self.height_px
    }

    /// Center point.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x_px + self.width_px * 0.5,
            self.y_px + self.height_px * 0.5,
        )
    }

    /// Return `true` when the interiors of both rects intersect.
    pub fn intersects(&self, other: &SceneRect) -> bool {
        self.x_px < other.right()
            && other.x_px < self.right()
            && self.y_px < other.bottom()
            && other.y_px < self.bottom()
    }
}

/// Half-open time window `[start_sec, end_sec)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    /// Inclusive start.
    pub start_sec: f64,
    /// Exclusive end.
    pub end_sec: f64,
}

impl TimeWindow {
    /// Create a window without validation.
    pub fn new(start_sec: f64, end_sec: f64) -> Self {
        Self { start_sec, end_sec }
    }

    /// Return `true` when `t` lies in `[start, end)`.
    pub fn contains(self, t: f64) -> bool {
        self.start_sec <= t && t < self.end_sec
    }

    /// Return `true` when both half-open windows share at least one instant.
    pub fn overlaps(self, other: TimeWindow) -> bool {
        self.start_sec < other.end_sec && other.start_sec < self.end_sec
    }

    /// Length of the window in seconds.
    pub fn duration_sec(self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// `true` when both bounds are finite and `end > start`.
    pub fn is_well_formed(self) -> bool {
        self.start_sec.is_finite() && self.end_sec.is_finite() && self.end_sec > self.start_sec
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PosereelResult<Self> {
        if den == 0 {
            return Err(PosereelError::configuration("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PosereelError::configuration("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Integer frame rate.
    pub fn whole(num: u32) -> PosereelResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Timestamp in seconds of frame `index`.
    pub fn frame_time_secs(self, index: u64) -> f64 {
        (index as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Number of frames whose timestamp falls inside `[0, duration_sec)`.
    pub fn frame_count(self, duration_sec: f64) -> u64 {
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return 0;
        }
        let approx = (duration_sec * self.as_f64()).ceil().max(0.0) as u64;
        // Float rounding can push the ceiling one frame past the window.
        let mut n = approx;
        while n > 0 && self.frame_time_secs(n - 1) >= duration_sec {
            n -= 1;
        }
        while self.frame_time_secs(n) < duration_sec {
            n += 1;
        }
        n
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
