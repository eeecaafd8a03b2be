use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    create_image, kCGNullWindowID, kCGWindowImageNominalResolution, kCGWindowListOptionOnScreenOnly,
};

use crate::logger;
use crate::types::*;
use super::{Platform, Screen};

pub struct DarwinPlatform;

impl Platform for DarwinPlatform {
    fn name(&self) -> &'static str {
        "darwin"
    }

    fn create_screen(&self) -> Box<dyn Screen> {
        Box::new(DarwinScreen)
    }
}

struct DarwinScreen;

impl DarwinScreen {
    fn post_mouse(&self, kind: CGEventType, at: Point) {
        let source = match CGEventSource::new(CGEventSourceStateID::HIDSystemState) {
            Ok(s) => s,
            Err(_) => {
                logger::warn_p("darwin", "failed to create event source");
                return;
            }
        };
        let point = CGPoint::new(at.x as f64, at.y as f64);
        if let Ok(event) = CGEvent::new_mouse_event(source, kind, point, CGMouseButton::Left) {
            event.post(CGEventTapLocation::HID);
        }
    }
}

impl Screen for DarwinScreen {
    fn move_to(&mut self, at: Point) {
        self.post_mouse(CGEventType::MouseMoved, at);
    }

    fn click_at(&mut self, at: Point) {
        self.post_mouse(CGEventType::MouseMoved, at);
        std::thread::sleep(std::time::Duration::from_millis(15));
        self.post_mouse(CGEventType::LeftMouseDown, at);
        std::thread::sleep(std::time::Duration::from_millis(15));
        self.post_mouse(CGEventType::LeftMouseUp, at);
        std::thread::sleep(std::time::Duration::from_millis(15));
    }

    fn capture(&mut self, rect: CaptureRect) -> Option<Capture> {
        let cg_rect = CGRect::new(
            &CGPoint::new(rect.l as f64, rect.t as f64),
            &CGSize::new(rect.w as f64, rect.h as f64),
        );

        let image = create_image(
            cg_rect,
            kCGWindowListOptionOnScreenOnly,
            kCGNullWindowID,
            kCGWindowImageNominalResolution,
        )?;

        let bpr = image.bytes_per_row() as u32;
        let height = image.height() as u32;
        let width = (image.width() as u32).min(bpr / 4);

        let cf_data = image.data();
        Some(Capture {
            data: cf_data.bytes().to_vec(),
            width,
            height,
            bytes_per_row: bpr,
        })
    }
}
