use cli_clipboard::{ClipboardContext, ClipboardProvider};
use super::{is_blank, SelectionSource};
use crate::shared::error::CaptureError;

/// Falls back to whatever text is currently on the system clipboard
pub struct ClipboardCapture;

impl SelectionSource for ClipboardCapture {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn capture(&self) -> Result<String, CaptureError> {
        let text = ClipboardContext::new()
            .and_then(|mut ctx| ctx.get_contents())
            .map_err(|e| CaptureError::System(format!("Clipboard read failed: {}", e)))?;

        if is_blank(&text) {
            return Err(CaptureError::NoTextFound);
        }
        Ok(text)
    }
}
