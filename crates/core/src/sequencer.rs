use crate::calibration::Calibration;
use crate::platform::{Platform, Screen};
use crate::detect::{ScreenDetector, ScreenScanner};
use crate::rig::{Rig, RigBuilder, Sequencer};
use crate::settings::Settings;
use crate::sleep;
use crate::types::*;

/// Click sequences for moving pieces around the puzzle.
pub struct ScreenSequencer {
    screen: Box<dyn Screen>,
    calibration: Calibration,
    settle_ms: u64,
}

impl ScreenSequencer {
    pub fn new(screen: Box<dyn Screen>, calibration: Calibration, settle_ms: u64) -> Self {
        Self { screen, calibration, settle_ms }
    }

    fn click(&mut self, at: Option<Point>) {
        let Some(at) = at else { return };
        self.screen.move_to(at);
        sleep::sleep_jitter(self.settle_ms / 3);
        self.screen.click_at(at);
        sleep::sleep_jitter(self.settle_ms);
    }
}

impl Sequencer for ScreenSequencer {
    /// Take a piece from the supply and drop it on the staging spot.
    fn fetch_new_piece(&mut self) {
        self.click(self.calibration.supply);
        self.click(self.calibration.staging);
    }

    fn place_at(&mut self, target: GridPoint) {
        let at = self.calibration.board_to_screen(target);
        self.click(self.calibration.staging);
        self.click(Some(at));
    }

    fn discard_current(&mut self) {
        self.click(self.calibration.staging);
        self.click(self.calibration.discard);
    }

    fn confirm_completion(&mut self) {
        self.click(self.calibration.confirm);
    }
}

/// Builds screen-backed collaborators from a platform.
pub struct ScreenRig {
    platform: Box<dyn Platform>,
    settings: Settings,
}

impl ScreenRig {
    pub fn new(platform: Box<dyn Platform>, settings: Settings) -> Self {
        Self { platform, settings }
    }
}

impl RigBuilder for ScreenRig {
    fn build(&mut self, calibration: &Calibration) -> Rig {
        let tolerance = self.settings.color_tolerance;
        Rig {
            detector: Box::new(ScreenDetector::new(self.platform.create_screen(), tolerance)),
            sequencer: Box::new(ScreenSequencer::new(
                self.platform.create_screen(),
                calibration.clone(),
                self.settings.timing.click_settle,
            )),
            scanner: Box::new(ScreenScanner::new(
                self.platform.create_screen(),
                calibration.clone(),
                tolerance,
            )),
        }
    }
}
