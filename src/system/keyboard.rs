//! Global key-down source feeding the gesture detector

#[cfg(target_os = "macos")]
mod macos;

use std::sync::Arc;
use thiserror::Error;

use crate::core::gesture::GestureDetector;

#[derive(Error, Debug)]
pub enum KeyTapError {
    #[error("Failed to create the keyboard event tap. Grant Accessibility or Input Monitoring access and restart.")]
    TapCreationFailed,

    #[error("Failed to attach the event tap to the run loop")]
    RunLoopSource,

    #[error("Global key monitoring is not supported on this platform")]
    Unsupported,
}

/// Install a listen-only global key tap and block the calling thread on its run loop.
///
/// Must be called on the main thread from within a tokio runtime context so the
/// detector can dispatch its handler.
pub fn run_key_tap(detector: Arc<GestureDetector>) -> Result<(), KeyTapError> {
    #[cfg(target_os = "macos")]
    {
        macos::run(detector)
    }

    #[cfg(not(target_os = "macos"))]
    {
        drop(detector);
        Err(KeyTapError::Unsupported)
    }
}
