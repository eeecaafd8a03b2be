use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::App;
use crate::ui;

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        app.drain_logs();
        if app.poll_supply_alert() {
            // terminal bell so the operator notices from another window
            io::stdout().write_all(b"\x07").ok();
            io::stdout().flush().ok();
        }

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with 100ms timeout (keeps TUI responsive)
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(dialog) = app.confirm.as_mut() {
                    match key.code {
                        KeyCode::Left | KeyCode::Right | KeyCode::Tab => dialog.toggle(),
                        KeyCode::Char('y') | KeyCode::Char('Y') => {
                            dialog.select(true);
                            app.answer_confirm(true);
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                            app.answer_confirm(false);
                        }
                        KeyCode::Enter => app.answer_confirm(true),
                        _ => {}
                    }
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
                    KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Home => app.start(),
                    KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::End => app.toggle_pause(),
                    KeyCode::Char('x') | KeyCode::Char('X') => app.stop(),
                    KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
                    KeyCode::PageUp => app.scroll_log_up(10),
                    KeyCode::PageDown => app.scroll_log_down(10),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}
