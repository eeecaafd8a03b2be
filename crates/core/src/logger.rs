use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();
static DEBUG: AtomicBool = AtomicBool::new(false);

struct Logger {
    file: File,
    tui_tx: Option<mpsc::Sender<String>>,
    prefixes: HashMap<String, u8>, // prefix -> color index
}

// Color indices for TUI rendering (mapped in ui.rs)
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;
pub const COLOR_GREEN: u8 = 3;

/// Initialize the global logger. Clears the log file.
pub fn init(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;
    let log_path = log_dir.join("app.log");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    LOGGER
        .set(Mutex::new(Logger { file, tui_tx: None, prefixes: HashMap::new() }))
        .ok();
    Ok(())
}

/// Turn debug-level lines on or off.
pub fn set_debug(on: bool) {
    DEBUG.store(on, Ordering::Relaxed);
}

/// Wire the TUI log channel.
pub fn set_tui_sender(tx: mpsc::Sender<String>) {
    if let Some(logger) = LOGGER.get() {
        let mut l = logger.lock().unwrap();
        l.tui_tx = Some(tx);
    }
}

/// Register a prefix with a color used by the `*_p` functions.
pub fn register_prefix(prefix: &str, color: u8) {
    if let Some(logger) = LOGGER.get() {
        let mut l = logger.lock().unwrap();
        l.prefixes.insert(prefix.to_string(), color);
    }
}

/// Format for TUI channel uses \x1f as field separator:
/// level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage
fn write_log(level: &str, prefix: &str, msg: &str) {
    let Some(logger) = LOGGER.get() else { return };
    let mut l = logger.lock().unwrap();

    let ts = Local::now().format("%H:%M:%S").to_string();
    let color = l.prefixes.get(prefix).copied().unwrap_or(0);

    let file_line = if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level, msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level, prefix, msg)
    };
    writeln!(l.file, "{}", file_line).ok();

    // Multi-line messages (board renders) go to the TUI line by line
    if let Some(tx) = &l.tui_tx {
        for line in msg.lines() {
            tx.send(format!("{}\x1f{}\x1f{}\x1f{}\x1f{}", level, prefix, color, ts, line)).ok();
        }
    }
}

pub fn info(msg: &str) {
    write_log("INFO", "", msg);
}

pub fn error(msg: &str) {
    write_log("ERROR", "", msg);
}

pub fn info_p(prefix: &str, msg: &str) {
    write_log("INFO", prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    write_log("WARN", prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    write_log("ERROR", prefix, msg);
}

/// Only written when debug logging is on.
pub fn debug_p(prefix: &str, msg: &str) {
    if DEBUG.load(Ordering::Relaxed) {
        write_log("DEBUG", prefix, msg);
    }
}
