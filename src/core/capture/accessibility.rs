use super::{is_blank, SelectionSource};
use crate::shared::error::CaptureError;

/// String attributes read from the focused element, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttribute {
    /// `AXSelectedText`
    SelectedText,
    /// `AXValue`, the element's full contents
    Value,
}

impl TextAttribute {
    pub fn ax_name(&self) -> &'static str {
        match self {
            TextAttribute::SelectedText => "AXSelectedText",
            TextAttribute::Value => "AXValue",
        }
    }
}

/// The slice of the platform accessibility API the capture needs
pub trait AccessibilityApi: Send + Sync {
    type Element;

    fn is_trusted(&self) -> bool;

    fn frontmost_application(&self) -> Option<Self::Element>;

    fn focused_element(&self, application: &Self::Element) -> Option<Self::Element>;

    fn string_attribute(&self, element: &Self::Element, attribute: TextAttribute) -> Option<String>;
}

/// Reads the selection of the focused element in the frontmost application
pub struct AccessibilityCapture<A> {
    api: A,
}

impl<A: AccessibilityApi> AccessibilityCapture<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: AccessibilityApi> SelectionSource for AccessibilityCapture<A> {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn capture(&self) -> Result<String, CaptureError> {
        if !self.api.is_trusted() {
            return Err(CaptureError::PermissionDenied);
        }

        let application = self
            .api
            .frontmost_application()
            .ok_or(CaptureError::NoFrontmostApplication)?;

        let element = self
            .api
            .focused_element(&application)
            .ok_or(CaptureError::NoFocusedElement)?;

        for attribute in [TextAttribute::SelectedText, TextAttribute::Value] {
            if let Some(text) = self.api.string_attribute(&element, attribute) {
                if !is_blank(&text) {
                    tracing::debug!("[Capture] Read {} ({} bytes)", attribute.ax_name(), text.len());
                    return Ok(text);
                }
            }
        }

        Err(CaptureError::NoTextFound)
    }
}
