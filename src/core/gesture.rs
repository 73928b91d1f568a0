//! Double-press gesture detection
//!
//! Turns a stream of key-down events into a single trigger when the qualifying
//! chord (primary modifier + `C`) is pressed twice within the timeout.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Handle;

/// Maximum gap between the two halves of a double press
pub const DOUBLE_PRESS_TIMEOUT: Duration = Duration::from_millis(500);

/// macOS virtual key code for `C` (kVK_ANSI_C)
pub const KEY_C: u16 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub command: bool,
    pub control: bool,
    pub option: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Command,
    Control,
    Option,
    Shift,
}

impl Modifiers {
    pub fn contains(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Command => self.command,
            Modifier::Control => self.control,
            Modifier::Option => self.option,
            Modifier::Shift => self.shift,
        }
    }
}

/// A raw key-down event as delivered by the platform key source
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key_code: u16,
    pub modifiers: Modifiers,
    pub at: Instant,
}

/// The modifier + key combination that counts as one half of the gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub modifier: Modifier,
    pub key_code: u16,
}

impl Chord {
    /// Cmd+C on macOS, Ctrl+C elsewhere
    pub fn copy() -> Self {
        let modifier = if cfg!(target_os = "macos") {
            Modifier::Command
        } else {
            Modifier::Control
        };
        Self {
            modifier,
            key_code: KEY_C,
        }
    }

    /// Extra modifiers held alongside the primary one still qualify
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key_code == self.key_code && event.modifiers.contains(self.modifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Not the chord, or no handler registered
    Ignored,
    /// First half recorded; waiting for the second
    Armed,
    /// Second half arrived in time; handler dispatched
    Fired,
}

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("Failed to register hotkey: no async runtime available to dispatch the handler")]
    NoRuntime,
}

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct GestureState {
    handler: Option<Handler>,
    dispatcher: Option<Handle>,
    pending: Option<Instant>,
}

pub struct GestureDetector {
    chord: Chord,
    timeout: Duration,
    state: Mutex<GestureState>,
}

impl GestureDetector {
    pub fn new(chord: Chord) -> Self {
        Self::with_timeout(chord, DOUBLE_PRESS_TIMEOUT)
    }

    pub fn with_timeout(chord: Chord, timeout: Duration) -> Self {
        Self {
            chord,
            timeout,
            state: Mutex::new(GestureState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GestureState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[Gesture] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    pub fn is_registered(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// Register the trigger handler, dispatching onto the current tokio runtime.
    ///
    /// A second registration while one is active is a no-op.
    pub fn register<F>(&self, handler: F) -> Result<(), GestureError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let dispatcher = Handle::try_current().map_err(|_| GestureError::NoRuntime)?;
        self.register_with(handler, dispatcher);
        Ok(())
    }

    pub fn register_with<F>(&self, handler: F, dispatcher: Handle)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut state = self.lock();
        if state.handler.is_some() {
            tracing::debug!("[Gesture] Hotkey already registered");
            return;
        }

        state.handler = Some(Arc::new(handler));
        state.dispatcher = Some(dispatcher);
        state.pending = None;
        tracing::info!("[Gesture] Double {:?}+C registered", self.chord.modifier);
    }

    /// Drop the handler and any half-finished gesture. Safe to call repeatedly.
    pub fn unregister(&self) {
        let mut state = self.lock();
        let was_registered = state.handler.is_some();
        *state = GestureState::default();

        if was_registered {
            tracing::info!("[Gesture] Hotkey unregistered");
        }
    }

    /// Feed one key-down event. Never blocks on the handler.
    pub fn handle_key_event(&self, event: &KeyEvent) -> GestureOutcome {
        if !self.chord.matches(event) {
            return GestureOutcome::Ignored;
        }

        let mut state = self.lock();
        let (handler, dispatcher) = match (&state.handler, &state.dispatcher) {
            (Some(handler), Some(dispatcher)) => (handler.clone(), dispatcher.clone()),
            _ => return GestureOutcome::Ignored,
        };

        match state.pending {
            Some(first) if event.at.saturating_duration_since(first) <= self.timeout => {
                // Clear rather than re-arm so a third press starts a new gesture
                state.pending = None;
                drop(state);

                tracing::debug!("[Gesture] Double press detected");
                dispatcher.spawn_blocking(move || handler());
                GestureOutcome::Fired
            }
            _ => {
                state.pending = Some(event.at);
                tracing::debug!("[Gesture] First press detected, waiting for second...");
                GestureOutcome::Armed
            }
        }
    }
}

impl Drop for GestureDetector {
    fn drop(&mut self) {
        self.unregister();
    }
}
