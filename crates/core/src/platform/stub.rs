use crate::types::*;
use crate::logger;
use super::{Platform, Screen};

/// Logs every pointer action and never sees any pixels.
pub struct StubPlatform;

impl Platform for StubPlatform {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn create_screen(&self) -> Box<dyn Screen> {
        logger::info_p("stub", "create_screen()");
        Box::new(StubScreen)
    }
}

struct StubScreen;

impl Screen for StubScreen {
    fn move_to(&mut self, at: Point) {
        logger::debug_p("stub", &format!("move_to({}, {})", at.x, at.y));
    }

    fn click_at(&mut self, at: Point) {
        logger::info_p("stub", &format!("click_at({}, {})", at.x, at.y));
    }

    fn capture(&mut self, rect: CaptureRect) -> Option<Capture> {
        logger::debug_p("stub", &format!("capture({:?})", rect));
        None
    }
}
