// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sigextract — Core types, configuration, and error definitions shared by the
// raster engine and the command-line front end.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::ExtractorConfig;
pub use error::SigextractError;
pub use types::*;
