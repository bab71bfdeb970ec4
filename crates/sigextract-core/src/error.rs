// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the signature extractor.

use thiserror::Error;

/// Top-level error type for all extractor operations.
///
/// Undersized crops and undo on an empty history are deliberately absent:
/// both are silent no-ops, not failures.
#[derive(Debug, Error)]
pub enum SigextractError {
    // -- Geometry --
    #[error("bitmap has no pixels ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("invalid display size {width}x{height}")]
    InvalidDisplay { width: f64, height: f64 },

    // -- Codec --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    // -- Execution --
    #[error("threshold worker failed: {0}")]
    Worker(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SigextractError>;
