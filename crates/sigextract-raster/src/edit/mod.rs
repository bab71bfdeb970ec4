// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster editing — erase and crop gestures with bounded undo.

pub mod geometry;
pub mod history;
pub mod preview;
pub mod session;

pub use geometry::{
    BitmapPoint, CropRegion, DisplayMapping, DisplayPoint, DisplaySize, EraseStroke, FloatRect,
};
pub use history::History;
pub use session::{CropPreview, EditSession};
