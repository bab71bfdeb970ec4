// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people extracting their signature.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents it.

use crate::error::SigextractError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth simply trying again.
    Transient,
    /// User must do something (pick another photo, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying; indicates a bug or corrupt data.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again may work.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `SigextractError` into a `HumanError`.
pub fn humanize_error(err: &SigextractError) -> HumanError {
    match err {
        SigextractError::EmptyBitmap { .. } => HumanError {
            message: "This picture is empty.".into(),
            suggestion: "Take or upload a photo of your signature and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SigextractError::BufferSize { .. } => HumanError {
            message: "The picture data is incomplete.".into(),
            suggestion: "Try loading the photo again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SigextractError::InvalidDisplay { .. } => HumanError {
            message: "The preview isn't visible yet.".into(),
            suggestion: "Wait for the preview to appear before drawing on it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SigextractError::Decode(_) => HumanError {
            message: "We couldn't open this picture.".into(),
            suggestion: "Save the photo as a JPG or PNG and upload it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SigextractError::Encode(_) => HumanError {
            message: "We couldn't save your signature.".into(),
            suggestion: "Try downloading it again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SigextractError::Worker(_) => HumanError {
            message: "Processing the picture stopped unexpectedly.".into(),
            suggestion: "Move the sensitivity slider again to reprocess it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SigextractError::Config(detail) => HumanError {
            message: "The settings file has a mistake in it.".into(),
            suggestion: format!("Fix or remove the settings file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SigextractError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "We couldn't find that file.".into(),
                suggestion: "Check the file name and folder, then try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We aren't allowed to use that file or folder.".into(),
                suggestion: "Choose a folder you can write to.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: "Try again in a moment.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        SigextractError::Serialization(_) => HumanError {
            message: "The settings couldn't be written.".into(),
            suggestion: "Try again; if it keeps happening, delete the settings file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
