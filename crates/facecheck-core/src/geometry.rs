//! Integer face boxes and contextual padding.

use serde::{Deserialize, Serialize};

/// Default contextual padding added around each detected face.
pub const DEFAULT_PADDING_RATIO: f32 = 0.10;

/// Axis-aligned face box in pixel coordinates.
///
/// `x_max` and `y_max` are exclusive, so `x_max - x_min` is the width.
/// Detector output may extend past the image; use [`BoundingBox::padded`]
/// or [`BoundingBox::clamped`] before indexing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    pub fn width(&self) -> u32 {
        (self.x_max - self.x_min).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y_max - self.y_min).max(0) as u32
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersect with the image extent `[0, width) × [0, height)`.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        let x_min = self.x_min.clamp(0, w);
        let y_min = self.y_min.clamp(0, h);
        Self {
            x_min,
            y_min,
            x_max: self.x_max.clamp(x_min, w),
            y_max: self.y_max.clamp(y_min, h),
        }
    }

    /// Grow each side by `ratio` of the corresponding span, then clamp to
    /// the image.
    ///
    /// The padding per side is truncated to whole pixels. A negative ratio
    /// is treated as zero, so the result always contains the clamped input.
    pub fn padded(&self, ratio: f32, width: u32, height: u32) -> Self {
        let ratio = ratio.max(0.0);
        let pad_x = (self.width() as f32 * ratio) as i32;
        let pad_y = (self.height() as f32 * ratio) as i32;
        Self {
            x_min: self.x_min.saturating_sub(pad_x),
            y_min: self.y_min.saturating_sub(pad_y),
            x_max: self.x_max.saturating_add(pad_x),
            y_max: self.y_max.saturating_add(pad_y),
        }
        .clamped(width, height)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x_min >= self.x_min
            && other.y_min >= self.y_min
            && other.x_max <= self.x_max
            && other.y_max <= self.y_max
    }
}
