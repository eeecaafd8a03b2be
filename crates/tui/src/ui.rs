use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style, Modifier},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use tilebot_core::types::{BotState, Grid, PieceType, StatusUpdate};
use crate::App;

fn banner_for(state: Option<BotState>, supply_alert: bool) -> (&'static str, Color) {
    if supply_alert {
        return ("SUPPLY EMPTY (refill, then HOME/p to resume)", Color::Magenta);
    }
    match state {
        None => ("IDLE (Press S to start)", Color::DarkGray),
        Some(BotState::Paused) => ("PAUSED (HOME/p to resume)", Color::Yellow),
        Some(BotState::Error) => ("ERROR (fix calibration, then S)", Color::Red),
        Some(BotState::Stopped) => ("STOPPED (Press S to start)", Color::Red),
        Some(BotState::Idle) => ("READY", Color::Cyan),
        Some(_) => ("RUNNING (P pause, X stop)", Color::Green),
    }
}

fn piece_color(p: PieceType) -> Color {
    match p {
        PieceType::Cyan => Color::Cyan,
        PieceType::Blue => Color::Blue,
        PieceType::Red => Color::Red,
        PieceType::Green => Color::Green,
        PieceType::Yellow => Color::Yellow,
        PieceType::Orange => Color::LightRed,
    }
}

fn grid_lines(grid: &Grid) -> Vec<Line<'static>> {
    grid.iter()
        .map(|row| {
            let mut spans = vec![Span::raw("   ")];
            for cell in row {
                spans.push(match cell {
                    Some(p) => Span::styled("██", Style::default().fg(piece_color(*p))),
                    None => Span::styled("··", Style::default().fg(Color::DarkGray)),
                });
            }
            Line::from(spans)
        })
        .collect()
}

fn status_lines(update: Option<&StatusUpdate>) -> Vec<Line<'static>> {
    let Some(u) = update else {
        return vec![Line::from(Span::styled(
            " waiting for start",
            Style::default().fg(Color::DarkGray),
        ))];
    };
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" status  ", label),
            Span::styled(u.message.clone(), value),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" boards  ", label),
            Span::styled(u.stats.boards_completed.to_string(), value),
            Span::styled("   placed ", label),
            Span::styled(u.stats.pieces_placed.to_string(), value),
            Span::styled("   discarded ", label),
            Span::styled(u.stats.pieces_discarded.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled(" board   ", label),
            Span::styled(u.board.clone(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(""),
    ];
    lines.extend(grid_lines(&u.grid));
    lines
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    // -- Left panel: bot status --

    let latest = app.status.latest();
    let (banner_label, banner_bg) = banner_for(latest.as_ref().map(|u| u.state), app.supply_alert);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(" s", Style::default().fg(Color::Yellow)),
        Span::raw(" start  "),
        Span::styled("p", Style::default().fg(Color::Yellow)),
        Span::raw(" pause  "),
        Span::styled("x", Style::default().fg(Color::Yellow)),
        Span::raw(" stop  "),
        Span::styled("l", Style::default().fg(Color::Yellow)),
        Span::raw(" logs  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]));
    lines.push(Line::from(""));
    lines.extend(status_lines(latest.as_ref()));

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    // Full-width centered banner
    let banner_width = left_chunks[0].width as usize;
    let pad_total = banner_width.saturating_sub(banner_label.len());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    let centered_banner = format!("{}{}{}", " ".repeat(pad_left), banner_label, " ".repeat(pad_right));
    let banner = Paragraph::new(Line::from(Span::styled(
        centered_banner,
        Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(banner, left_chunks[0]);

    let status_panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(status_panel, left_chunks[1]);

    // -- Right panel: logs --
    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let max_scroll = total.saturating_sub(visible_height);
        let scroll = app.log_scroll.min(max_scroll);
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end]
            .iter()
            .map(|m| parse_log_line(m))
            .collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Logs ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    if parts.len() < 5 {
        return Line::from(raw);
    }

    let level = parts[0];
    let prefix = parts[1];
    let color_idx: u8 = parts[2].parse().unwrap_or(0);
    let timestamp = parts[3];
    let message = parts[4];

    let line_color = match color_idx {
        1 => Color::DarkGray,   // COLOR_GRAY
        2 => Color::LightBlue,  // COLOR_BLUE
        3 => Color::LightGreen, // COLOR_GREEN
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];

    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        "DEBUG" => spans.push(Span::styled("debug ", Style::default().fg(Color::DarkGray))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(line_color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(message, Style::default().fg(line_color)));

    Line::from(spans)
}
