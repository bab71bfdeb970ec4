// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Owned RGBA8 bitmap — the unit every thresholding pass, edit, and undo
// snapshot works on. Decoding and PNG encoding go through the `image` crate.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use sigextract_core::error::{Result, SigextractError};
use tracing::{debug, info, instrument};

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Row-major RGBA8 pixel buffer.
///
/// `data.len() == width * height * 4` always holds. Zero-sized bitmaps are
/// representable; operations that cannot work on them reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    // -- Construction ---------------------------------------------------------

    /// A fully transparent black bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// A bitmap with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a bitmap by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap an existing RGBA8 buffer, checking its length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(SigextractError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba_image(image.to_rgba8())
    }

    /// Decode encoded bytes (JPEG, PNG, ...) into a bitmap.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| SigextractError::Decode(err.to_string()))?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(&image))
    }

    /// Load and decode an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            SigextractError::Decode(format!("{}: {}", path.as_ref().display(), err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Image loaded"
        );
        Ok(Self::from_dynamic(&image))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The raw RGBA8 buffer.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Pixel at (x, y), or `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Overwrite the pixel at (x, y). Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Copy into an `image::RgbaImage` (for compositing and drawing).
    pub fn to_rgba_image(&self) -> RgbaImage {
        // The length invariant guarantees `from_raw` accepts the buffer.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    // -- Editing --------------------------------------------------------------

    /// Make every pixel whose centre lies within `radius` of `(cx, cy)` fully
    /// transparent. Colour channels are left as they were.
    ///
    /// Only in-bounds pixels are touched, so the centre may lie outside the
    /// bitmap. Returns the number of pixels whose alpha changed.
    pub fn erase_circle(&mut self, cx: f64, cy: f64, radius: f64) -> usize {
        if self.is_empty() || !cx.is_finite() || !cy.is_finite() {
            return 0;
        }
        if radius.is_nan() || radius <= 0.0 {
            return 0;
        }

        let x_lo = ((cx - radius - 0.5).floor() as i64).max(0);
        let y_lo = ((cy - radius - 0.5).floor() as i64).max(0);
        let x_hi = ((cx + radius + 0.5).ceil() as i64).min(i64::from(self.width));
        let y_hi = ((cy + radius + 0.5).ceil() as i64).min(i64::from(self.height));
        let r_sq = radius * radius;

        let mut cleared = 0;
        for y in y_lo..y_hi {
            let dy = y as f64 + 0.5 - cy;
            for x in x_lo..x_hi {
                let dx = x as f64 + 0.5 - cx;
                if dx * dx + dy * dy > r_sq {
                    continue;
                }
                let alpha = self.offset(x as u32, y as u32) + 3;
                if self.data[alpha] != 0 {
                    self.data[alpha] = 0;
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Copy out a rectangular region. The region is clamped to the bitmap.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Bitmap {
        let safe_x = x.min(self.width);
        let safe_y = y.min(self.height);
        let safe_w = width.min(self.width - safe_x);
        let safe_h = height.min(self.height - safe_y);

        let row_bytes = safe_w as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * safe_h as usize);
        for row in safe_y..safe_y + safe_h {
            let start = self.offset(safe_x, row);
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        Bitmap {
            width: safe_w,
            height: safe_h,
            data,
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG, preserving transparency.
    #[instrument(skip(self), fields(width = self.width, height = self.height))]
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(&self.data, self.width, self.height, ExtendedColorType::Rgba8)
            .map_err(|err| SigextractError::Encode(format!("PNG encoding failed: {err}")))?;
        debug!(bytes = buffer.len(), "PNG encoded");
        Ok(buffer)
    }

    /// Encode as PNG and write it to `path`.
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}
