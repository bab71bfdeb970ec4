// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thresholding — grayscale/integral image, Bradley–Roth binarization, and the
// background worker that applies only the most recent request.

pub mod adaptive;
pub mod integral;
pub mod worker;

pub use adaptive::{ThresholdParams, ThresholdStats, ink_mask, threshold, threshold_with_stats};
pub use integral::{GrayPlane, IntegralImage};
pub use worker::{PendingThreshold, ThresholdOutcome, ThresholdWorker};
