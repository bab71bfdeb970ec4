// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive edit session over a thresholded bitmap: freehand erase,
// rectangular crop, and bounded undo.
//
// A gesture (pointer down → moves → up) is one undoable unit. The snapshot is
// taken when an erase gesture starts, or just before a crop is applied.

use image::RgbaImage;
use sigextract_core::config::ExtractorConfig;
use sigextract_core::error::Result;
use sigextract_core::types::{EditMode, MAX_ERASER_RADIUS, MIN_CROP_SIZE, MIN_ERASER_RADIUS};
use tracing::{debug, info, instrument};

use crate::bitmap::Bitmap;
use crate::edit::geometry::{
    BitmapPoint, CropRegion, DisplayMapping, DisplayPoint, DisplaySize, EraseStroke, FloatRect,
};
use crate::edit::history::History;
use crate::edit::preview;

/// Default eraser radius in display pixels.
const DEFAULT_ERASER_RADIUS: f64 = 30.0;

/// A pointer position captured in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    display: DisplayPoint,
    bitmap: BitmapPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Erasing,
    Cropping {
        start: Anchor,
        end: Anchor,
    },
}

/// Live crop rectangle while the user drags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPreview {
    /// Rectangle to draw over the on-screen preview.
    pub display: FloatRect,
    /// The same rectangle on the bitmap grid, clamped to the bitmap.
    pub bitmap: FloatRect,
}

/// Owns the live bitmap and its undo history.
///
/// Nothing outside the session can mutate either; all changes go through the
/// gesture methods and `undo`.
#[derive(Debug, Clone)]
pub struct EditSession {
    bitmap: Bitmap,
    history: History,
    mode: EditMode,
    display: Option<DisplaySize>,
    eraser_radius: f64,
    min_crop_size: f64,
    gesture: Gesture,
    hover: Option<DisplayPoint>,
}

impl EditSession {
    // -- Construction ---------------------------------------------------------

    /// Start a session with default settings (crop mode, 10 undo steps).
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            history: History::default(),
            mode: EditMode::default(),
            display: None,
            eraser_radius: DEFAULT_ERASER_RADIUS,
            min_crop_size: MIN_CROP_SIZE,
            gesture: Gesture::Idle,
            hover: None,
        }
    }

    pub fn with_config(bitmap: Bitmap, config: &ExtractorConfig) -> Self {
        let mut session = Self::new(bitmap);
        session.history = History::new(config.history_limit);
        session.mode = config.initial_mode;
        session.min_crop_size = config.min_crop_size;
        session.set_eraser_radius(config.eraser_radius);
        session
    }

    /// Replace the live bitmap with a fresh thresholding result.
    ///
    /// History, gesture, and the reported display size are dropped; mode and
    /// eraser radius carry over.
    pub fn restart(&mut self, bitmap: Bitmap) {
        info!(
            width = bitmap.width(),
            height = bitmap.height(),
            discarded_snapshots = self.history.len(),
            "Edit session restarted"
        );
        self.bitmap = bitmap;
        self.history.clear();
        self.gesture = Gesture::Idle;
        self.display = None;
        self.hover = None;
    }

    // -- Accessors ------------------------------------------------------------

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn eraser_radius(&self) -> f64 {
        self.eraser_radius
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_gesture_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Current eraser cursor position (display space), if shown.
    pub fn hover_position(&self) -> Option<DisplayPoint> {
        self.hover
    }

    // -- Settings -------------------------------------------------------------

    /// Switch gesture interpretation. History and bitmap are untouched; a
    /// gesture of the previous mode is abandoned.
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "Edit mode changed");
        self.mode = mode;
        self.gesture = Gesture::Idle;
        self.hover = None;
    }

    /// Set the eraser radius in display pixels, clamped to 10–150.
    pub fn set_eraser_radius(&mut self, radius: f64) {
        let radius = if radius.is_nan() { MIN_ERASER_RADIUS } else { radius };
        self.eraser_radius = radius.clamp(MIN_ERASER_RADIUS, MAX_ERASER_RADIUS);
    }

    /// Record the on-screen size of the rendered preview.
    pub fn set_display_size(&mut self, size: DisplaySize) {
        debug!(width = size.width(), height = size.height(), "display size reported");
        self.display = Some(size);
    }

    /// Forget the display size; input is then treated as bitmap pixels.
    pub fn clear_display_size(&mut self) {
        self.display = None;
    }

    /// Mapping from the reported display size to the live bitmap.
    pub fn mapping(&self) -> DisplayMapping {
        let (w, h) = self.bitmap.dimensions();
        match self.display {
            Some(size) => DisplayMapping::new(w, h, size),
            None => DisplayMapping::identity(w, h),
        }
    }

    fn anchor(&self, point: DisplayPoint) -> Anchor {
        let mapping = self.mapping();
        Anchor {
            display: point,
            bitmap: mapping.clamp(mapping.to_bitmap(point)),
        }
    }

    // -- Erase ----------------------------------------------------------------

    /// Start an erase gesture: snapshot, then erase at `point`.
    ///
    /// Ignored (returns `false`) outside erase mode.
    pub fn begin_erase(&mut self, point: DisplayPoint) -> bool {
        if self.mode != EditMode::Erase {
            debug!("begin_erase ignored outside erase mode");
            return false;
        }
        self.history.push(self.bitmap.clone());
        self.gesture = Gesture::Erasing;
        self.hover = Some(point);
        let cleared = self.erase_at(point);
        debug!(cleared, history = self.history.len(), "erase gesture started");
        true
    }

    /// Erase at `point` while a gesture is active. No snapshot is taken.
    pub fn continue_erase(&mut self, point: DisplayPoint) -> bool {
        if self.gesture != Gesture::Erasing {
            return false;
        }
        self.hover = Some(point);
        self.erase_at(point);
        true
    }

    /// Finish the current erase gesture.
    pub fn end_erase(&mut self) -> bool {
        if self.gesture != Gesture::Erasing {
            return false;
        }
        self.gesture = Gesture::Idle;
        self.hover = None;
        true
    }

    fn erase_at(&mut self, point: DisplayPoint) -> usize {
        let mapping = self.mapping();
        let stroke = EraseStroke {
            center: mapping.to_bitmap(point),
            radius: mapping.scale_radius(self.eraser_radius),
        };
        stroke.apply(&mut self.bitmap)
    }

    /// Move the eraser cursor without erasing.
    pub fn hover(&mut self, point: DisplayPoint) {
        if self.mode == EditMode::Erase {
            self.hover = Some(point);
        }
    }

    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    // -- Crop -----------------------------------------------------------------

    /// Start dragging a crop rectangle at `point`.
    ///
    /// Ignored (returns `false`) outside crop mode.
    pub fn begin_crop(&mut self, point: DisplayPoint) -> bool {
        if self.mode != EditMode::Crop {
            debug!("begin_crop ignored outside crop mode");
            return false;
        }
        let anchor = self.anchor(point);
        self.gesture = Gesture::Cropping {
            start: anchor,
            end: anchor,
        };
        true
    }

    /// Move the free corner of the crop rectangle. Nothing is applied yet.
    pub fn update_crop(&mut self, point: DisplayPoint) -> Option<CropPreview> {
        let anchor = self.anchor(point);
        if let Gesture::Cropping { end, .. } = &mut self.gesture {
            *end = anchor;
        }
        self.crop_preview()
    }

    /// The rectangle being dragged, if any.
    pub fn crop_preview(&self) -> Option<CropPreview> {
        match self.gesture {
            Gesture::Cropping { start, end } => Some(CropPreview {
                display: FloatRect::from_corners(
                    start.display.x,
                    start.display.y,
                    end.display.x,
                    end.display.y,
                ),
                bitmap: FloatRect::from_corners(
                    start.bitmap.x,
                    start.bitmap.y,
                    end.bitmap.x,
                    end.bitmap.y,
                ),
            }),
            _ => None,
        }
    }

    /// Apply the dragged rectangle.
    ///
    /// Rectangles under the minimum size are dropped silently with no
    /// snapshot. Otherwise the live bitmap is snapshotted and replaced by the
    /// region, which is returned.
    #[instrument(skip(self))]
    pub fn commit_crop(&mut self) -> Option<CropRegion> {
        let preview = self.crop_preview()?;
        self.gesture = Gesture::Idle;

        let Some(region) = CropRegion::from_rect(preview.bitmap, self.min_crop_size) else {
            debug!(
                width = preview.bitmap.width,
                height = preview.bitmap.height,
                "crop below minimum size discarded"
            );
            return None;
        };

        self.history.push(self.bitmap.clone());
        self.bitmap = self
            .bitmap
            .crop(region.x, region.y, region.width, region.height);
        // The preview is re-laid out at the new size; wait for a new report.
        self.display = None;

        info!(
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            history = self.history.len(),
            "Crop applied"
        );
        Some(region)
    }

    /// Abandon an in-progress crop drag.
    pub fn cancel_crop(&mut self) -> bool {
        if matches!(self.gesture, Gesture::Cropping { .. }) {
            self.gesture = Gesture::Idle;
            return true;
        }
        false
    }

    // -- Undo -----------------------------------------------------------------

    /// Restore the newest snapshot. A no-op returning `false` when there is
    /// nothing to undo. Any gesture in progress is abandoned.
    pub fn undo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let Some(previous) = self.history.pop() else {
            debug!("undo with empty history ignored");
            return false;
        };
        if previous.dimensions() != self.bitmap.dimensions() {
            self.display = None;
        }
        self.bitmap = previous;
        info!(
            width = self.bitmap.width(),
            height = self.bitmap.height(),
            remaining = self.history.len(),
            "Undo applied"
        );
        true
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the live bitmap as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        self.bitmap.encode_png()
    }

    /// The live bitmap over white, with the crop rectangle or eraser cursor
    /// drawn on top.
    pub fn render_preview(&self) -> RgbaImage {
        preview::render(self)
    }
}
