use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;
use std::time::Instant;
use core_foundation::base::TCFType;
use core_foundation::mach_port::CFMachPortRef;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, EventField,
};

use super::KeyTapError;
use crate::core::gesture::{GestureDetector, KeyEvent, Modifiers};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// What the tap callback does with one delivered event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapAction {
    Deliver,
    /// The system switched the tap off; it stays off until re-enabled
    Reenable,
    Ignore,
}

fn tap_action(event_type: CGEventType) -> TapAction {
    match event_type {
        CGEventType::KeyDown => TapAction::Deliver,
        CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => TapAction::Reenable,
        _ => TapAction::Ignore,
    }
}

fn modifiers(flags: CGEventFlags) -> Modifiers {
    Modifiers {
        command: flags.contains(CGEventFlags::CGEventFlagCommand),
        control: flags.contains(CGEventFlags::CGEventFlagControl),
        option: flags.contains(CGEventFlags::CGEventFlagAlternate),
        shift: flags.contains(CGEventFlags::CGEventFlagShift),
    }
}

fn key_event(event: &CGEvent) -> KeyEvent {
    KeyEvent {
        key_code: event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16,
        modifiers: modifiers(event.get_flags()),
        at: Instant::now(),
    }
}

pub(super) fn run(detector: Arc<GestureDetector>) -> Result<(), KeyTapError> {
    // Filled in once the tap exists; the callback needs it to switch the tap back on
    let port = Arc::new(AtomicPtr::<c_void>::new(ptr::null_mut()));
    let callback_port = Arc::clone(&port);

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        move |_proxy, event_type, event| {
            match tap_action(event_type) {
                TapAction::Deliver => {
                    detector.handle_key_event(&key_event(event));
                }
                TapAction::Reenable => {
                    let port = callback_port.load(Ordering::Acquire);
                    if port.is_null() {
                        tracing::error!("[KeyTap] Event tap disabled before it was installed");
                    } else {
                        unsafe { CGEventTapEnable(port as CFMachPortRef, true) };
                        tracing::warn!("[KeyTap] Event tap disabled by the system, re-enabled");
                    }
                }
                TapAction::Ignore => {}
            }
            // Listen-only: the event always passes through untouched
            None
        },
    )
    .map_err(|_| KeyTapError::TapCreationFailed)?;

    port.store(tap.mach_port.as_concrete_TypeRef() as *mut c_void, Ordering::Release);

    let source = tap
        .mach_port
        .create_runloop_source(0)
        .map_err(|_| KeyTapError::RunLoopSource)?;

    unsafe {
        CFRunLoop::get_current().add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();

    tracing::info!("[KeyTap] Listening for key events");
    CFRunLoop::run_current();
    Ok(())
}
