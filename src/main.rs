use std::io;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use anyhow::Result;
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use tilebot_core::{logger, supervisor, settings::Settings};
use tilebot_core::bot::Bot;
use tilebot_core::calibration::{Calibration, FileCalibration};
use tilebot_core::catalog::Catalog;
use tilebot_core::platform::{create_platform, hotkey};
use tilebot_core::sequencer::ScreenRig;
use tilebot_core::types::Command;
use tilebot_tui::StatusBoard;

fn main() -> Result<()> {
    let force_stub = std::env::args().any(|a| a == "--stub");
    let force_debug = std::env::args().any(|a| a == "--debug");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    logger::init(&cwd.join("logs"))?;

    let settings = Settings::load_or_init(&cwd.join("settings.json"));
    logger::set_debug(force_debug || settings.debug);

    let calibration_path = cwd.join(&settings.calibration_path);
    if Calibration::write_template(&calibration_path)? {
        logger::warn_p(
            "bot",
            &format!("wrote empty {}, fill in the screen points", calibration_path.display()),
        );
    }

    let catalog = Catalog::load_or_standard(settings.catalog_path.as_deref())?;
    let platform = create_platform(force_stub);
    logger::info(&format!("platform: {}", platform.name()));

    // Channels
    let (log_tx, log_rx) = mpsc::channel::<String>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    // Wire logger to TUI
    logger::set_tui_sender(log_tx);
    logger::info("tilebot started");

    // Bot worker on a background thread
    let status = Arc::new(StatusBoard::default());
    let bot = Bot::new(
        Box::new(FileCalibration::new(calibration_path)),
        Box::new(ScreenRig::new(platform, settings.clone())),
        status.clone(),
        settings,
        catalog,
    );
    let worker = supervisor::spawn(bot, cmd_rx);

    // Global HOME/END hotkeys
    hotkey::start_hotkey_listener(cmd_tx.clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = tilebot_tui::App::new(status, log_rx, cmd_tx);

    // Run TUI event loop on main thread
    let result = tilebot_tui::event::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // The worker finishes its current action, then sees Quit
    app.cmd_tx.send(Command::Quit).ok();
    worker.join().ok();

    result
}
