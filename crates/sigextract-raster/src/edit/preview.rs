// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview compositing: live bitmap over white plus the active tool overlay.

use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{Blend, draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use sigextract_core::types::EditMode;

use crate::edit::geometry::FloatRect;
use crate::edit::session::EditSession;

const BACKDROP: Rgba<u8> = Rgba([255, 255, 255, 255]);
const ACCENT: Rgba<u8> = Rgba([30, 215, 96, 255]);
const CROP_FILL: Rgba<u8> = Rgba([30, 215, 96, 51]);
const BRUSH_FILL: Rgba<u8> = Rgba([30, 215, 96, 102]);

/// Render the session for display at bitmap resolution.
pub fn render(session: &EditSession) -> RgbaImage {
    let (width, height) = session.bitmap().dimensions();
    let mut canvas = RgbaImage::from_pixel(width, height, BACKDROP);
    imageops::overlay(&mut canvas, &session.bitmap().to_rgba_image(), 0, 0);

    let mut canvas = Blend(canvas);
    if let Some(crop) = session.crop_preview() {
        if let Some(rect) = pixel_rect(crop.bitmap) {
            draw_filled_rect_mut(&mut canvas, rect, CROP_FILL);
            draw_hollow_rect_mut(&mut canvas, rect, ACCENT);
        }
    } else if session.mode() == EditMode::Erase {
        if let Some(hover) = session.hover_position() {
            let mapping = session.mapping();
            let center = mapping.to_bitmap(hover);
            let radius = mapping.scale_radius(session.eraser_radius()).round() as i32;
            draw_filled_circle_mut(
                &mut canvas,
                (center.x.round() as i32, center.y.round() as i32),
                radius,
                BRUSH_FILL,
            );
        }
    }
    canvas.0
}

fn pixel_rect(rect: FloatRect) -> Option<Rect> {
    let width = rect.width.round() as u32;
    let height = rect.height.round() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Rect::at(rect.x.floor() as i32, rect.y.floor() as i32).of_size(width, height))
}
