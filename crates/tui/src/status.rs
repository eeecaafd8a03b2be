use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tilebot_core::rig::StatusSink;
use tilebot_core::types::StatusUpdate;

/// Latest status from the bot worker, read by the TUI each frame.
#[derive(Default)]
pub struct StatusBoard {
    latest: Mutex<Option<StatusUpdate>>,
    supply_empty: AtomicBool,
}

impl StatusBoard {
    pub fn latest(&self) -> Option<StatusUpdate> {
        self.latest.lock().unwrap().clone()
    }

    /// A session is live unless nothing started yet or it ended.
    pub fn is_running(&self) -> bool {
        self.latest
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|u| !u.state.is_terminal())
    }

    /// Returns true once per supply-empty notification.
    pub fn take_supply_empty(&self) -> bool {
        self.supply_empty.swap(false, Ordering::AcqRel)
    }
}

impl StatusSink for StatusBoard {
    fn report(&self, update: &StatusUpdate) {
        *self.latest.lock().unwrap() = Some(update.clone());
    }

    fn supply_empty(&self) {
        self.supply_empty.store(true, Ordering::Release);
    }
}
