//! Boundaries between the control loop and the outside world.
//!
//! The loop only talks to these traits; screen-backed implementations live
//! in `detect` and `sequencer`, fakes live in the tests.

use anyhow::Result;

use crate::calibration::Calibration;
use crate::types::*;

/// Supplies screen calibration for a session.
pub trait CalibrationSource: Send {
    fn load_calibration(&mut self) -> Result<Calibration>;
}

/// Classifies whatever piece is visible around a screen point.
pub trait Detector: Send {
    fn classify_at(&mut self, at: Point) -> Option<PieceType>;
}

/// Pointer action sequences. Each call returns once the action is issued.
pub trait Sequencer: Send {
    fn fetch_new_piece(&mut self);
    fn place_at(&mut self, target: GridPoint);
    fn discard_current(&mut self);
    fn confirm_completion(&mut self);
}

/// Reads the whole board back from the screen.
pub trait BoardScanner: Send {
    fn scan_board(&mut self) -> RawGrid;
}

/// Receives every state transition for display.
pub trait StatusSink: Send + Sync {
    fn report(&self, update: &StatusUpdate);

    /// The supply ran dry and the bot paused itself.
    fn supply_empty(&self) {}
}

/// Collaborators for one session, built once calibration is known.
pub struct Rig {
    pub detector: Box<dyn Detector>,
    pub sequencer: Box<dyn Sequencer>,
    pub scanner: Box<dyn BoardScanner>,
}

pub trait RigBuilder: Send {
    fn build(&mut self, calibration: &Calibration) -> Rig;
}
