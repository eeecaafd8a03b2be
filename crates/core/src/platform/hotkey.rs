use std::sync::mpsc::Sender;

use crate::types::Command;

/// Global keys: HOME starts a session, END pauses or resumes it.
#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
fn command_for(is_home: bool) -> Command {
    if is_home {
        Command::Start
    } else {
        Command::TogglePause
    }
}

/// Start a background thread that turns HOME/END presses into commands.
#[cfg(target_os = "macos")]
pub fn start_hotkey_listener(tx: Sender<Command>) {
    use std::ffi::c_void;

    type CGEventTapProxy = *mut c_void;
    type CGEventRef = *mut c_void;
    type CFMachPortRef = *mut c_void;
    type CFRunLoopSourceRef = *mut c_void;
    type CFRunLoopRef = *mut c_void;
    type CFStringRef = *const c_void;
    type CGEventMask = u64;
    type CGEventType = u32;

    type CGEventTapCallBack = unsafe extern "C" fn(
        CGEventTapProxy,
        CGEventType,
        CGEventRef,
        *mut c_void,
    ) -> CGEventRef;

    const K_CG_HID_EVENT_TAP: u32 = 0;
    const K_CG_HEAD_INSERT_EVENT_TAP: u32 = 0;
    const K_CG_EVENT_TAP_OPTION_LISTEN_ONLY: u32 = 1;
    const CG_EVENT_KEY_DOWN: u32 = 10;
    const K_CG_KEYBOARD_EVENT_KEYCODE: u32 = 9;
    const K_CG_KEYBOARD_EVENT_AUTOREPEAT: u32 = 8;

    const KEYCODE_HOME: i64 = 115;
    const KEYCODE_END: i64 = 119;

    extern "C" {
        fn CGEventTapCreate(
            tap: u32,
            place: u32,
            options: u32,
            events_of_interest: CGEventMask,
            callback: CGEventTapCallBack,
            user_info: *mut c_void,
        ) -> CFMachPortRef;

        fn CFMachPortCreateRunLoopSource(
            allocator: *const c_void,
            port: CFMachPortRef,
            order: i64,
        ) -> CFRunLoopSourceRef;

        fn CFRunLoopGetCurrent() -> CFRunLoopRef;

        fn CFRunLoopAddSource(
            rl: CFRunLoopRef,
            source: CFRunLoopSourceRef,
            mode: CFStringRef,
        );

        fn CFRunLoopRun();

        fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
        fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);

        static kCFRunLoopCommonModes: CFStringRef;
    }

    unsafe extern "C" fn hotkey_callback(
        _proxy: CGEventTapProxy,
        event_type: CGEventType,
        event: CGEventRef,
        user_info: *mut c_void,
    ) -> CGEventRef {
        unsafe {
            if event_type != CG_EVENT_KEY_DOWN {
                return event;
            }
            if CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_AUTOREPEAT) != 0 {
                return event;
            }

            let keycode = CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_KEYCODE);
            if keycode == KEYCODE_HOME || keycode == KEYCODE_END {
                // user_info is the Sender leaked below; only this thread reads it
                let tx = &*(user_info as *const Sender<Command>);
                tx.send(command_for(keycode == KEYCODE_HOME)).ok();
            }

            event
        }
    }

    std::thread::spawn(move || {
        unsafe {
            let mask: CGEventMask = 1 << CG_EVENT_KEY_DOWN;
            let tx_ptr = Box::into_raw(Box::new(tx)) as *mut c_void;

            let tap = CGEventTapCreate(
                K_CG_HID_EVENT_TAP,
                K_CG_HEAD_INSERT_EVENT_TAP,
                K_CG_EVENT_TAP_OPTION_LISTEN_ONLY,
                mask,
                hotkey_callback,
                tx_ptr,
            );

            if tap.is_null() {
                crate::logger::error(
                    "failed to create event tap for HOME/END - \
                     grant Accessibility permission to your terminal",
                );
                drop(Box::from_raw(tx_ptr as *mut Sender<Command>));
                return;
            }

            let source = CFMachPortCreateRunLoopSource(std::ptr::null(), tap, 0);
            let run_loop = CFRunLoopGetCurrent();
            CFRunLoopAddSource(run_loop, source, kCFRunLoopCommonModes);
            CGEventTapEnable(tap, true);
            crate::logger::info("global hotkeys HOME/END registered");

            CFRunLoopRun(); // blocks forever
        }
    });
}

/// Start a background thread that turns HOME/END presses into commands (Windows).
#[cfg(target_os = "windows")]
pub fn start_hotkey_listener(tx: Sender<Command>) {
    use std::ffi::c_void;

    type HWND = *mut c_void;
    type BOOL = i32;
    type UINT = u32;
    type WPARAM = usize;
    type LPARAM = isize;
    type DWORD = u32;
    type LONG = i32;

    #[repr(C)]
    struct POINT {
        x: LONG,
        y: LONG,
    }

    #[repr(C)]
    struct MSG {
        hwnd: HWND,
        message: UINT,
        w_param: WPARAM,
        l_param: LPARAM,
        time: DWORD,
        pt: POINT,
    }

    const MOD_NOREPEAT: u32 = 0x4000;
    const VK_HOME: u32 = 0x24;
    const VK_END: u32 = 0x23;
    const WM_HOTKEY: u32 = 0x0312;
    const HOME_ID: i32 = 1;
    const END_ID: i32 = 2;

    extern "system" {
        fn RegisterHotKey(hwnd: HWND, id: i32, fs_modifiers: UINT, vk: UINT) -> BOOL;
        fn GetMessageW(
            msg: *mut MSG,
            hwnd: HWND,
            msg_filter_min: UINT,
            msg_filter_max: UINT,
        ) -> BOOL;
    }

    std::thread::spawn(move || {
        unsafe {
            let home = RegisterHotKey(std::ptr::null_mut(), HOME_ID, MOD_NOREPEAT, VK_HOME);
            let end = RegisterHotKey(std::ptr::null_mut(), END_ID, MOD_NOREPEAT, VK_END);
            if home == 0 || end == 0 {
                crate::logger::error(
                    "failed to register HOME/END hotkeys - \
                     another application may have claimed them",
                );
                return;
            }

            crate::logger::info("global hotkeys HOME/END registered");

            let mut msg: MSG = std::mem::zeroed();
            // GetMessageW blocks until a message arrives; returns 0 on WM_QUIT
            while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {
                if msg.message == WM_HOTKEY {
                    match msg.w_param as i32 {
                        HOME_ID => { tx.send(command_for(true)).ok(); }
                        END_ID => { tx.send(command_for(false)).ok(); }
                        _ => {}
                    }
                }
            }
        }
    });
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn start_hotkey_listener(_tx: Sender<Command>) {
    crate::logger::info("global hotkeys not supported here, use the TUI keys");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(command_for(true), Command::Start);
        assert_eq!(command_for(false), Command::TogglePause);
    }
}
