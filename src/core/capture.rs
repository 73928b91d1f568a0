//! Selected-text acquisition
//!
//! Strategies are tried in a fixed order and the first non-blank result wins:
//! 1. Accessibility introspection of the focused element
//! 2. The system clipboard
//!
//! When every strategy fails the caller gets a single `SelectionUnavailable`
//! carrying the primary strategy's error.

pub mod accessibility;
pub mod clipboard;

use crate::shared::error::{CaptureError, SelectionUnavailable};

pub use accessibility::{AccessibilityApi, AccessibilityCapture, TextAttribute};
pub use clipboard::ClipboardCapture;

/// One way of obtaining the user's current selection
pub trait SelectionSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn capture(&self) -> Result<String, CaptureError>;
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

pub struct TextAcquirer {
    sources: Vec<Box<dyn SelectionSource>>,
}

impl TextAcquirer {
    pub fn new(sources: Vec<Box<dyn SelectionSource>>) -> Self {
        Self { sources }
    }

    /// Accessibility first, clipboard second
    pub fn platform_default() -> Self {
        let mut sources: Vec<Box<dyn SelectionSource>> = Vec::with_capacity(2);

        #[cfg(target_os = "macos")]
        sources.push(Box::new(AccessibilityCapture::new(
            crate::system::accessibility::NativeAccessibility,
        )));

        #[cfg(not(target_os = "macos"))]
        sources.push(Box::new(crate::system::accessibility::UnsupportedAccessibility));

        sources.push(Box::new(ClipboardCapture));
        Self::new(sources)
    }

    pub fn acquire(&self) -> Result<String, SelectionUnavailable> {
        let mut primary_error = None;

        for source in &self.sources {
            let error = match source.capture() {
                Ok(text) if !is_blank(&text) => {
                    tracing::info!("[Capture] Success via {}", source.name());
                    return Ok(text);
                }
                Ok(_) => CaptureError::NoTextFound,
                Err(e) => e,
            };

            tracing::debug!("[Capture] {} failed: {}, falling back...", source.name(), error);
            primary_error.get_or_insert(error);
        }

        let cause = primary_error
            .unwrap_or_else(|| CaptureError::System("No capture strategies configured".to_string()));
        tracing::warn!("[Capture] No text captured (primary cause: {})", cause);
        Err(SelectionUnavailable { cause })
    }
}
