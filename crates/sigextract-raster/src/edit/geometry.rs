// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display-space ↔ bitmap-space geometry.
//
// Pointer input arrives in on-screen coordinates while edits apply to the
// bitmap's own pixel grid. All conversions go through `DisplayMapping` so the
// eraser radius and crop rectangle always agree on the same scale factors.

use imageproc::rect::Rect;
use sigextract_core::error::{Result, SigextractError};

use crate::bitmap::Bitmap;

/// A point in on-screen (display) coordinates, relative to the preview's
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in bitmap pixel coordinates (fractional).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapPoint {
    pub x: f64,
    pub y: f64,
}

impl BitmapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen size of the rendered preview. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    width: f64,
    height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(SigextractError::InvalidDisplay { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Axis-aligned rectangle with fractional coordinates (either space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FloatRect {
    /// Normalise two opposite corners into origin + non-negative size.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }
}

/// Scale factors between a display surface and a bitmap.
///
/// X and Y scale independently because the preview may be stretched
/// non-uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    scale_x: f64,
    scale_y: f64,
    bitmap_width: u32,
    bitmap_height: u32,
}

impl DisplayMapping {
    pub fn new(bitmap_width: u32, bitmap_height: u32, display: DisplaySize) -> Self {
        Self {
            scale_x: f64::from(bitmap_width) / display.width,
            scale_y: f64::from(bitmap_height) / display.height,
            bitmap_width,
            bitmap_height,
        }
    }

    /// One display pixel per bitmap pixel.
    pub fn identity(bitmap_width: u32, bitmap_height: u32) -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            bitmap_width,
            bitmap_height,
        }
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Mean of the two axis scales; keeps a brush roughly circular under
    /// aspect distortion.
    pub fn average_scale(&self) -> f64 {
        (self.scale_x + self.scale_y) / 2.0
    }

    pub fn to_bitmap(&self, point: DisplayPoint) -> BitmapPoint {
        BitmapPoint {
            x: point.x * self.scale_x,
            y: point.y * self.scale_y,
        }
    }

    pub fn to_display(&self, point: BitmapPoint) -> DisplayPoint {
        DisplayPoint {
            x: point.x / self.scale_x,
            y: point.y / self.scale_y,
        }
    }

    /// Convert a display-space radius to bitmap pixels.
    pub fn scale_radius(&self, radius: f64) -> f64 {
        radius * self.average_scale()
    }

    /// Clamp into `[0, W] × [0, H]` (inclusive, so a corner can sit on the
    /// far edge of the bitmap).
    pub fn clamp(&self, point: BitmapPoint) -> BitmapPoint {
        let clamp_axis = |v: f64, max: u32| {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, f64::from(max)) }
        };
        BitmapPoint {
            x: clamp_axis(point.x, self.bitmap_width),
            y: clamp_axis(point.y, self.bitmap_height),
        }
    }
}

/// Rectangle of whole bitmap pixels to keep when cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Normalise a dragged rectangle.
    ///
    /// Returns `None` when either side is below `min_size` (an accidental
    /// click). The origin and size are truncated to whole pixels.
    pub fn from_rect(rect: FloatRect, min_size: f64) -> Option<Self> {
        if rect.width < min_size || rect.height < min_size {
            return None;
        }
        Some(Self {
            x: rect.x.floor() as u32,
            y: rect.y.floor() as u32,
            width: rect.width.floor() as u32,
            height: rect.height.floor() as u32,
        })
    }

    /// Same region as an `imageproc` rectangle, for drawing.
    pub fn to_rect(&self) -> Option<Rect> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(Rect::at(self.x as i32, self.y as i32).of_size(self.width, self.height))
    }
}

/// One circular erase in bitmap space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraseStroke {
    pub center: BitmapPoint,
    pub radius: f64,
}

impl EraseStroke {
    /// Whether the pixel at (x, y), sampled at its centre, falls inside.
    pub fn covers(&self, x: u32, y: u32) -> bool {
        let dx = f64::from(x) + 0.5 - self.center.x;
        let dy = f64::from(y) + 0.5 - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Punch this stroke into `bitmap`. Returns the number of pixels cleared.
    pub fn apply(&self, bitmap: &mut Bitmap) -> usize {
        bitmap.erase_circle(self.center.x, self.center.y, self.radius)
    }
}
