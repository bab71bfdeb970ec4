// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the signature extractor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of snapshots kept for undo.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Crops narrower or shorter than this (in bitmap pixels) are discarded as
/// accidental clicks.
pub const MIN_CROP_SIZE: f64 = 20.0;

/// Per-channel amount subtracted from ink pixels.
pub const INK_DARKEN: u8 = 20;

/// Smallest eraser radius the UI exposes, in display pixels.
pub const MIN_ERASER_RADIUS: f64 = 10.0;

/// Largest eraser radius the UI exposes, in display pixels.
pub const MAX_ERASER_RADIUS: f64 = 150.0;

/// Thresholding sensitivity `t`, always within [0, 1].
///
/// Exposed to users as an integer percentage (0–100). Higher values demand a
/// pixel be darker relative to its neighbourhood before it counts as ink.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Sensitivity(f64);

impl Sensitivity {
    /// Build from a fraction, clamping into [0, 1]. NaN maps to 0.
    pub fn new(fraction: f64) -> Self {
        if fraction.is_nan() {
            return Self(0.0);
        }
        Self(fraction.clamp(0.0, 1.0))
    }

    /// Build from the UI percentage; anything above 100 is clamped.
    pub fn from_percent(percent: u8) -> Self {
        Self(f64::from(percent.min(100)) / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Round-trip back to the UI percentage.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl From<f64> for Sensitivity {
    fn from(fraction: f64) -> Self {
        Self::new(fraction)
    }
}

impl From<Sensitivity> for f64 {
    fn from(sensitivity: Sensitivity) -> Self {
        sensitivity.0
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self::from_percent(15)
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Which gesture interpretation applies to pointer input. Exactly one is
/// active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Freehand alpha punch-out.
    Erase,
    /// Rectangular crop.
    #[default]
    Crop,
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erase => f.write_str("erase"),
            Self::Crop => f.write_str("crop"),
        }
    }
}

/// Download file name for an exported signature, stamped with the export
/// time in Unix milliseconds.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("firma-extraida-{}.png", now.timestamp_millis())
}
