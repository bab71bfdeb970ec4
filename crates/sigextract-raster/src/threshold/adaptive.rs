// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bradley–Roth adaptive thresholding. Each pixel is compared with the mean of
// a window around it, so uneven lighting across a photographed page does not
// swallow the signature. Window sums come from the integral image, which keeps
// the pass O(W×H) whatever the window size.

use sigextract_core::error::{Result, SigextractError};
use sigextract_core::types::{INK_DARKEN, Sensitivity};
use tracing::{debug, info, instrument};

use crate::bitmap::Bitmap;
use crate::threshold::integral::{GrayPlane, IntegralImage};

/// Output colour for background pixels: white, fully transparent.
const BACKGROUND: [u8; 4] = [255, 255, 255, 0];

/// Parameters for one thresholding pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Window size `s`, always ⌊W/8⌋ of the source width.
    pub window: u32,
    /// Sensitivity `t`.
    pub sensitivity: Sensitivity,
    /// Amount subtracted from each colour channel of ink pixels.
    pub ink_darken: u8,
}

impl ThresholdParams {
    /// Derive the parameters for a source of the given width.
    pub fn for_width(width: u32, sensitivity: Sensitivity) -> Self {
        Self {
            window: width / 8,
            sensitivity,
            ink_darken: INK_DARKEN,
        }
    }

    pub fn with_ink_darken(mut self, ink_darken: u8) -> Self {
        self.ink_darken = ink_darken;
        self
    }

    fn half_window(&self) -> f64 {
        f64::from(self.window) / 2.0
    }
}

/// Ink/background tally of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThresholdStats {
    pub ink_pixels: u64,
    pub total_pixels: u64,
}

impl ThresholdStats {
    /// Fraction of pixels classified as ink.
    pub fn ink_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.ink_pixels as f64 / self.total_pixels as f64
    }
}

/// Clamp `centre ± half` into `[0, limit - 1]` and floor, per axis.
fn window_bounds(centre: u32, half: f64, limit: u32) -> (u32, u32) {
    let c = f64::from(centre);
    let lo = (c - half).max(0.0).floor() as u32;
    let hi = (c + half).min(f64::from(limit - 1)).floor() as u32;
    (lo, hi)
}

/// Classify every pixel of `source`; `true` marks ink. Row-major.
///
/// A pixel is ink when `gray · count <= windowSum · (1 − t)`, i.e. it is at
/// least `t` darker than its neighbourhood mean.
pub fn ink_mask(source: &Bitmap, params: &ThresholdParams) -> Result<Vec<bool>> {
    let (width, height) = source.dimensions();
    if source.is_empty() {
        return Err(SigextractError::EmptyBitmap { width, height });
    }

    let plane = GrayPlane::from_bitmap(source);
    let integral = IntegralImage::from_plane(&plane);
    let half = params.half_window();
    let keep = 1.0 - params.sensitivity.value();

    let mut mask = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let (y1, y2) = window_bounds(y, half, height);
        for x in 0..width {
            let (x1, x2) = window_bounds(x, half, width);
            let count = u64::from(x2 - x1) * u64::from(y2 - y1);
            let sum = integral.window_sum(x1, y1, x2, y2);
            let gray = u64::from(plane.at(i64::from(x), i64::from(y)));
            mask.push((gray * count) as f64 <= sum as f64 * keep);
        }
    }
    Ok(mask)
}

/// Binarize `source` with the default ink darkening.
///
/// Ink pixels keep their colour (darkened) and become opaque; everything else
/// becomes transparent white. Deterministic: identical inputs give identical
/// output bytes. Fails with `EmptyBitmap` when either dimension is zero.
pub fn threshold(source: &Bitmap, sensitivity: Sensitivity) -> Result<Bitmap> {
    let params = ThresholdParams::for_width(source.width(), sensitivity);
    threshold_with_stats(source, &params).map(|(bitmap, _)| bitmap)
}

/// Binarize `source` and report how many pixels became ink.
#[instrument(
    skip(source, params),
    fields(
        width = source.width(),
        height = source.height(),
        window = params.window,
        sensitivity = %params.sensitivity
    )
)]
pub fn threshold_with_stats(
    source: &Bitmap,
    params: &ThresholdParams,
) -> Result<(Bitmap, ThresholdStats)> {
    let mask = ink_mask(source, params)?;
    let darken = params.ink_darken;

    let mut out = Vec::with_capacity(source.as_raw().len());
    let mut ink_pixels = 0u64;
    for (rgba, &is_ink) in source.as_raw().chunks_exact(4).zip(&mask) {
        if is_ink {
            ink_pixels += 1;
            out.extend_from_slice(&[
                rgba[0].saturating_sub(darken),
                rgba[1].saturating_sub(darken),
                rgba[2].saturating_sub(darken),
                255,
            ]);
        } else {
            out.extend_from_slice(&BACKGROUND);
        }
    }

    let stats = ThresholdStats {
        ink_pixels,
        total_pixels: mask.len() as u64,
    };
    let bitmap = Bitmap::from_raw(source.width(), source.height(), out)?;
    debug!(bytes = bitmap.as_raw().len(), "threshold output assembled");
    info!(
        ink_pixels = stats.ink_pixels,
        ink_ratio = stats.ink_ratio(),
        "Adaptive threshold complete"
    );
    Ok((bitmap, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Light paper with a darker diagonal stroke and a soft horizontal
    /// lighting gradient.
    fn signature_photo(width: u32, height: u32) -> Bitmap {
        Bitmap::from_fn(width, height, |x, y| {
            let paper = 200u32.saturating_sub(x / 4) as u8;
            let on_stroke = (x as i64 - 2 * y as i64).abs() <= 2;
            if on_stroke {
                [40, 40, 90, 255]
            } else {
                [paper, paper, paper.saturating_sub(5), 255]
            }
        })
    }

    fn ink_count(bitmap: &Bitmap, percent: u8) -> usize {
        let params = ThresholdParams::for_width(bitmap.width(), Sensitivity::from_percent(percent));
        ink_mask(bitmap, &params).unwrap().into_iter().filter(|&ink| ink).count()
    }

    #[test]
    fn window_is_an_eighth_of_width() {
        let params = ThresholdParams::for_width(100, Sensitivity::default());
        assert_eq!(params.window, 12);
        assert_eq!(params.ink_darken, 20);
        assert_eq!(ThresholdParams::for_width(7, Sensitivity::default()).window, 0);
    }

    #[test]
    fn deterministic_output() {
        let src = signature_photo(96, 48);
        let a = threshold(&src, Sensitivity::from_percent(15)).unwrap();
        let b = threshold(&src, Sensitivity::from_percent(15)).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn output_keeps_dimensions() {
        let src = signature_photo(64, 40);
        let out = threshold(&src, Sensitivity::default()).unwrap();
        assert_eq!(out.dimensions(), (64, 40));
    }

    #[test]
    fn stroke_is_ink_and_paper_is_transparent() {
        let src = signature_photo(96, 48);
        let out = threshold(&src, Sensitivity::from_percent(15)).unwrap();

        // On the stroke: original colour minus 20, opaque.
        assert_eq!(out.pixel(40, 20), Some([20, 20, 70, 255]));
        // Plain paper far from the stroke.
        assert_eq!(out.pixel(5, 40), Some(BACKGROUND));
    }

    #[test]
    fn uniform_region_is_background() {
        let src = Bitmap::filled(64, 64, [128, 128, 128, 255]);
        for percent in [1u8, 15, 50, 99] {
            let out = threshold(&src, Sensitivity::from_percent(percent)).unwrap();
            for y in 8..56 {
                for x in 8..56 {
                    assert_eq!(out.pixel(x, y).unwrap()[3], 0, "({x}, {y}) at {percent}%");
                }
            }
        }
    }

    #[test]
    fn single_pixel_does_not_fail() {
        let src = Bitmap::filled(1, 1, [90, 90, 90, 255]);
        let out = threshold(&src, Sensitivity::default()).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        for (w, h) in [(0, 0), (0, 5), (5, 0)] {
            match threshold(&Bitmap::new(w, h), Sensitivity::default()) {
                Err(SigextractError::EmptyBitmap { width, height }) => {
                    assert_eq!((width, height), (w, h));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn raising_sensitivity_never_adds_ink() {
        let src = signature_photo(80, 60);
        let counts: Vec<usize> = (0..=100u8).step_by(5).map(|p| ink_count(&src, p)).collect();
        for pair in counts.windows(2) {
            assert!(pair[1] <= pair[0], "ink counts not monotone: {counts:?}");
        }
        assert!(counts[0] > counts[counts.len() - 1]);
    }

    #[test]
    fn ink_darkening_floors_at_zero() {
        let src = Bitmap::from_fn(32, 32, |x, _| {
            if x == 16 { [5, 30, 10, 255] } else { [250, 250, 250, 255] }
        });
        let params = ThresholdParams::for_width(32, Sensitivity::from_percent(15));
        let (out, stats) = threshold_with_stats(&src, &params).unwrap();
        assert_eq!(out.pixel(16, 10), Some([0, 10, 0, 255]));
        assert_eq!(stats.total_pixels, 32 * 32);
        assert!(stats.ink_pixels >= 32);
    }

    #[test]
    fn stats_ratio() {
        let stats = ThresholdStats {
            ink_pixels: 25,
            total_pixels: 100,
        };
        assert_eq!(stats.ink_ratio(), 0.25);
        assert_eq!(ThresholdStats::default().ink_ratio(), 0.0);
    }
}
