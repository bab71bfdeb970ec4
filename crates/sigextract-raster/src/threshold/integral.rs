// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale plane and integral image (summed-area table) for constant-time
// window sums.

use crate::bitmap::{Bitmap, CHANNELS};

/// Rec.601 luma weights scaled by 1000, so grayscale stays integral.
const WEIGHT_R: u32 = 299;
const WEIGHT_G: u32 = 587;
const WEIGHT_B: u32 = 114;

/// Grayscale of a single RGBA pixel, scaled by 1000.
pub fn gray_scaled(rgba: &[u8]) -> u32 {
    WEIGHT_R * u32::from(rgba[0]) + WEIGHT_G * u32::from(rgba[1]) + WEIGHT_B * u32::from(rgba[2])
}

/// Per-pixel grayscale (×1000) of a bitmap, row-major.
///
/// `at` clamps coordinates to the nearest edge pixel; it never wraps and never
/// zero-pads.
#[derive(Debug, Clone)]
pub struct GrayPlane {
    width: u32,
    height: u32,
    values: Vec<u32>,
}

impl GrayPlane {
    pub fn from_bitmap(bitmap: &Bitmap) -> Self {
        let values = bitmap
            .as_raw()
            .chunks_exact(CHANNELS)
            .map(gray_scaled)
            .collect();
        Self {
            width: bitmap.width(),
            height: bitmap.height(),
            values,
        }
    }

    /// Edge-clamped lookup. The plane must be non-empty.
    pub fn at(&self, x: i64, y: i64) -> u32 {
        let cx = x.clamp(0, i64::from(self.width) - 1) as usize;
        let cy = y.clamp(0, i64::from(self.height) - 1) as usize;
        self.values[cy * self.width as usize + cx]
    }
}

/// Inclusive 2-D prefix sum: `at(x, y)` is the sum of gray over
/// `[0..=x] × [0..=y]`.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: u32,
    height: u32,
    sums: Vec<u64>,
}

impl IntegralImage {
    /// Build the table in one pass, O(W×H).
    pub fn from_plane(plane: &GrayPlane) -> Self {
        let (w, h) = (plane.width as usize, plane.height as usize);
        let mut sums = vec![0u64; w * h];

        for y in 0..h {
            let mut row_sum = 0u64;
            for x in 0..w {
                row_sum += u64::from(plane.at(x as i64, y as i64));
                let above = if y == 0 { 0 } else { sums[(y - 1) * w + x] };
                sums[y * w + x] = row_sum + above;
            }
        }

        Self {
            width: plane.width,
            height: plane.height,
            sums,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cumulative sum over `[0..=x] × [0..=y]`.
    pub fn at(&self, x: u32, y: u32) -> u64 {
        self.sums[y as usize * self.width as usize + x as usize]
    }

    /// Sum over the half-open window `(x1..=x2] × (y1..=y2]` by four-corner
    /// inclusion–exclusion. Requires `x1 <= x2` and `y1 <= y2`.
    pub fn window_sum(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> u64 {
        // Adding the diagonal corners first keeps every intermediate >= 0.
        self.at(x2, y2) + self.at(x1, y1) - self.at(x1, y2) - self.at(x2, y1)
    }
}
