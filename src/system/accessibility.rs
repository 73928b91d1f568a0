//! Platform accessibility access and the permission prompt

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{AxElement, NativeAccessibility};

use crate::core::pipeline::PermissionPrompt;

#[cfg(not(target_os = "macos"))]
use crate::{core::capture::SelectionSource, shared::error::CaptureError};

/// Stand-in for the accessibility source where no native backend exists
#[cfg(not(target_os = "macos"))]
pub struct UnsupportedAccessibility;

#[cfg(not(target_os = "macos"))]
impl SelectionSource for UnsupportedAccessibility {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn capture(&self) -> Result<String, CaptureError> {
        Err(CaptureError::System(
            "Accessibility capture is not supported on this platform".to_string(),
        ))
    }
}

/// Shows the OS dialog that leads the user to the accessibility settings
pub struct SystemPermissionPrompt;

impl PermissionPrompt for SystemPermissionPrompt {
    #[cfg(target_os = "macos")]
    fn request_permission(&self) {
        if macos::request_trust_with_prompt() {
            tracing::info!("[Permissions] Accessibility permission granted");
        } else {
            tracing::warn!("[Permissions] Accessibility permission not granted, system prompt shown");
            tracing::info!("[Permissions] Enable it in System Settings > Privacy & Security > Accessibility");
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn request_permission(&self) {
        tracing::warn!("[Permissions] No accessibility permission prompt on this platform");
    }
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_reports_system_error() {
        assert!(matches!(
            UnsupportedAccessibility.capture(),
            Err(CaptureError::System(_))
        ));
    }
}
