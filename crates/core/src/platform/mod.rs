pub mod stub;
pub mod hotkey;

#[cfg(target_os = "macos")]
pub mod darwin;

use crate::types::*;
use crate::logger;

/// Low-level pointer and pixel access in absolute screen coordinates.
pub trait Screen: Send {
    fn move_to(&mut self, at: Point);
    fn click_at(&mut self, at: Point);
    fn capture(&mut self, rect: CaptureRect) -> Option<Capture>;
}

/// Platform-level factory for screen handles.
pub trait Platform: Send {
    fn name(&self) -> &'static str;
    fn create_screen(&self) -> Box<dyn Screen>;
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Box<dyn Platform> {
    logger::register_prefix("bot", logger::COLOR_BLUE);
    logger::register_prefix("board", logger::COLOR_GREEN);
    logger::register_prefix("detect", logger::COLOR_GRAY);
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return Box::new(stub::StubPlatform);
    }
    #[cfg(target_os = "macos")]
    {
        logger::register_prefix("darwin", logger::COLOR_GRAY);
        return Box::new(darwin::DarwinPlatform);
    }
    #[cfg(not(target_os = "macos"))]
    {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return Box::new(stub::StubPlatform);
    }
}
