//! Error taxonomies
//!
//! Capture and translation failures are kept in separate enums so callers can
//! tell them apart without matching on strings. `PipelineError` only tags which
//! stage produced a failure; it never converts one taxonomy into the other.

use thiserror::Error;

/// Failures of a single selection-capture strategy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Accessibility permission is required to capture text. Please enable it in System Settings > Privacy & Security > Accessibility.")]
    PermissionDenied,

    #[error("Unable to identify the frontmost application")]
    NoFrontmostApplication,

    #[error("No focused UI element found")]
    NoFocusedElement,

    #[error("No text found in the focused element")]
    NoTextFound,

    #[error("Text capture timed out")]
    Timeout,

    #[error("System error: {0}")]
    System(String),
}

/// All capture strategies were exhausted.
///
/// Presented to users as "no text selected"; the primary strategy's failure is
/// kept so logs can tell "permission never granted" from "nothing selected".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No text selected (primary capture failed: {cause})")]
pub struct SelectionUnavailable {
    pub cause: CaptureError,
}

impl SelectionUnavailable {
    pub fn permission_denied(&self) -> bool {
        self.cause == CaptureError::PermissionDenied
    }
}

/// Failures of a translation call
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Translation server is not running. Please start the server with: plamo-translate --precision bf16 server")]
    ServerUnavailable,

    #[error("Invalid response from translation server")]
    InvalidResponse,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Selected text is too long for translation")]
    TextTooLong,

    #[error("Unsupported language combination")]
    UnsupportedLanguage,

    #[error("No text selected. Please select text and try again.")]
    NoTextSelected,

    #[error("Invalid translation configuration: {0}")]
    InvalidConfiguration(String),
}

/// Stage that produced a failed pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquisition,
    Translation,
}

/// A failed pipeline run, tagged with the stage that produced it
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Acquisition(SelectionUnavailable),

    #[error(transparent)]
    Translation(TranslationError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Acquisition(_) => Stage::Acquisition,
            PipelineError::Translation(_) => Stage::Translation,
        }
    }
}

/// Settings persistence failures
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
