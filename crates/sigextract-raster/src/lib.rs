// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sigextract-raster — Raster engine for the signature extractor.
//
// Provides the RGBA bitmap model, adaptive (Bradley–Roth) thresholding over an
// integral image with a last-request-wins background worker, and the edit
// session (erase, crop, bounded undo, preview overlay, PNG export).

pub mod bitmap;
pub mod edit;
pub mod extractor;
pub mod threshold;

// Re-export the primary types so callers can use `sigextract_raster::EditSession` etc.
pub use bitmap::Bitmap;
pub use edit::{
    BitmapPoint, CropPreview, CropRegion, DisplayMapping, DisplayPoint, DisplaySize, EditSession,
    EraseStroke, FloatRect, History,
};
pub use extractor::SignatureExtractor;
pub use threshold::{
    PendingThreshold, ThresholdOutcome, ThresholdParams, ThresholdStats, ThresholdWorker,
    threshold, threshold_with_stats,
};
