//! OS event queue servicing for the control thread.
//!
//! On macOS and Windows `global-hotkey` only delivers presses while the
//! thread that created its manager services the OS event queue. The control
//! loop calls `pump` whenever its channel is empty, so one thread both runs
//! searches and keeps hotkey events flowing.

use std::time::Duration;

/// Longest the control loop waits on the OS queue before checking its channel.
pub const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Whether hotkey delivery on this platform depends on `pump`.
pub const NEEDS_PUMP: bool = cfg!(any(target_os = "macos", target_os = "windows"));

/// One-time setup before the first `pump`. Main thread only.
pub fn prepare() {
    platform::prepare();
}

/// Dispatch pending OS events, waiting up to `timeout` when none are queued.
pub fn pump(timeout: Duration) {
    platform::pump(timeout);
}

#[cfg(target_os = "macos")]
mod platform {
    use std::os::raw::c_char;
    use std::time::Duration;

    use objc::runtime::{Object, BOOL, YES};
    use objc::{class, msg_send, sel, sel_impl};

    use crate::logging;

    /// NSApplicationActivationPolicyAccessory: no Dock icon
    const ACTIVATION_POLICY_ACCESSORY: i64 = 1;
    const EVENT_MASK_ANY: u64 = u64::MAX;
    const DEFAULT_RUN_LOOP_MODE: &[u8] = b"kCFRunLoopDefaultMode\0";

    pub fn prepare() {
        unsafe {
            let app: *mut Object = msg_send![class!(NSApplication), sharedApplication];
            let _: BOOL = msg_send![app, setActivationPolicy: ACTIVATION_POLICY_ACCESSORY];
            let _: () = msg_send![app, finishLaunching];
        }
        logging::log("APP", "NSApplication prepared for hotkey delivery");
    }

    pub fn pump(timeout: Duration) {
        unsafe {
            let pool: *mut Object = msg_send![class!(NSAutoreleasePool), new];
            let app: *mut Object = msg_send![class!(NSApplication), sharedApplication];
            let mode: *mut Object = msg_send![
                class!(NSString),
                stringWithUTF8String: DEFAULT_RUN_LOOP_MODE.as_ptr() as *const c_char
            ];
            let mut until: *mut Object = msg_send![
                class!(NSDate),
                dateWithTimeIntervalSinceNow: timeout.as_secs_f64()
            ];

            loop {
                let event: *mut Object = msg_send![
                    app,
                    nextEventMatchingMask: EVENT_MASK_ANY
                    untilDate: until
                    inMode: mode
                    dequeue: YES
                ];
                if event.is_null() {
                    break;
                }
                let _: () = msg_send![app, sendEvent: event];
                // Drain the rest without waiting
                until = msg_send![class!(NSDate), distantPast];
            }

            let _: () = msg_send![pool, drain];
        }
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use std::time::Duration;

    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    pub fn prepare() {}

    pub fn pump(timeout: Duration) {
        let mut dispatched = false;
        unsafe {
            let mut msg = MSG::default();
            // None: every window and thread message of this thread
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
                dispatched = true;
            }
        }
        if !dispatched {
            std::thread::sleep(timeout);
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
mod platform {
    use std::time::Duration;

    pub fn prepare() {}

    pub fn pump(timeout: Duration) {
        std::thread::sleep(timeout);
    }
}
