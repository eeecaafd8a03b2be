use std::sync::{Arc, mpsc};

use tilebot_core::types::Command;

use crate::confirm::ConfirmDialog;
use crate::status::StatusBoard;

pub struct App {
    pub status: Arc<StatusBoard>,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub cmd_tx: mpsc::Sender<Command>,
    pub confirm: Option<ConfirmDialog>,
    pub supply_alert: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        status: Arc<StatusBoard>,
        log_rx: mpsc::Receiver<String>,
        cmd_tx: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            status,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            cmd_tx,
            confirm: None,
            supply_alert: false,
            should_quit: false,
        }
    }

    pub fn drain_logs(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
            if self.log_scroll > 0 {
                // keep the view anchored while the user reads back
                self.log_scroll += 1;
            }
        }
    }

    /// Picks up a pending supply-empty signal. Returns true when it is new.
    pub fn poll_supply_alert(&mut self) -> bool {
        if self.status.take_supply_empty() {
            self.supply_alert = true;
            return true;
        }
        false
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn start(&mut self) {
        self.supply_alert = false;
        self.cmd_tx.send(Command::Start).ok();
    }

    pub fn toggle_pause(&mut self) {
        self.supply_alert = false;
        self.cmd_tx.send(Command::TogglePause).ok();
    }

    pub fn stop(&mut self) {
        self.cmd_tx.send(Command::Stop).ok();
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    /// Quit right away when idle, ask first while a session runs.
    pub fn request_quit(&mut self) {
        if self.status.is_running() {
            self.confirm = Some(ConfirmDialog::new("Stop the bot and quit?"));
        } else {
            self.quit();
        }
    }

    pub fn answer_confirm(&mut self, accept: bool) {
        let yes = self.confirm.take().is_some_and(|d| accept && d.selected);
        if yes {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.cmd_tx.send(Command::Quit).ok();
        self.should_quit = true;
    }
}
