use std::ffi::c_void;
use cocoa::base::{id, nil};
use cocoa::foundation::NSAutoreleasePool;
use core_foundation::base::{CFGetTypeID, CFRelease, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};
use objc::{class, msg_send, sel, sel_impl};

use crate::core::capture::{AccessibilityApi, TextAttribute};

type AXUIElementRef = *const c_void;
type AXError = i32;

const AX_ERROR_SUCCESS: AXError = 0;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AXError;
}

/// Check trust and show the system dialog when it is missing.
///
/// The process usually needs a restart after the user grants access.
pub fn request_trust_with_prompt() -> bool {
    let key = CFString::from_static_string("AXTrustedCheckOptionPrompt");
    let value = CFBoolean::true_value();
    let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);

    unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
}

/// Process id of `NSWorkspace.frontmostApplication`
///
/// Runs off the main thread, so it brings its own autorelease pool.
fn frontmost_pid() -> Option<i32> {
    unsafe {
        let pool = NSAutoreleasePool::new(nil);

        let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
        let front_app: id = msg_send![workspace, frontmostApplication];
        let pid: i32 = if front_app == nil {
            0
        } else {
            msg_send![front_app, processIdentifier]
        };

        pool.drain();
        (pid > 0).then_some(pid)
    }
}

/// An owned `AXUIElementRef`, released on drop
pub struct AxElement(AXUIElementRef);

impl AxElement {
    fn application(pid: i32) -> Option<Self> {
        let element = unsafe { AXUIElementCreateApplication(pid) };
        (!element.is_null()).then_some(Self(element))
    }

    /// Copy an attribute value; the caller owns the returned reference
    fn copy_attribute(&self, name: &'static str) -> Option<CFTypeRef> {
        let attribute = CFString::from_static_string(name);
        let mut value: CFTypeRef = std::ptr::null();

        let result = unsafe {
            AXUIElementCopyAttributeValue(self.0, attribute.as_concrete_TypeRef(), &mut value)
        };

        if result != AX_ERROR_SUCCESS {
            tracing::debug!("[AX] {} unavailable (AXError {})", name, result);
            return None;
        }
        (!value.is_null()).then_some(value)
    }

    fn element_attribute(&self, name: &'static str) -> Option<AxElement> {
        self.copy_attribute(name).map(|value| AxElement(value as AXUIElementRef))
    }

    fn string_attribute(&self, name: &'static str) -> Option<String> {
        let value = self.copy_attribute(name)?;

        unsafe {
            if CFGetTypeID(value) != CFString::type_id() {
                // Non-string values (e.g. AXValue of a slider)
                CFRelease(value);
                return None;
            }
            Some(CFString::wrap_under_create_rule(value as CFStringRef).to_string())
        }
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0 as CFTypeRef) }
    }
}

/// `AccessibilityApi` backed by the macOS AX framework
pub struct NativeAccessibility;

impl AccessibilityApi for NativeAccessibility {
    type Element = AxElement;

    fn is_trusted(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    fn frontmost_application(&self) -> Option<AxElement> {
        AxElement::application(frontmost_pid()?)
    }

    fn focused_element(&self, application: &AxElement) -> Option<AxElement> {
        application.element_attribute("AXFocusedUIElement")
    }

    fn string_attribute(&self, element: &AxElement, attribute: TextAttribute) -> Option<String> {
        element.string_attribute(attribute.ax_name())
    }
}
