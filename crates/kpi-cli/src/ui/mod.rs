//! TUI rendering: orchestrates all panes.

pub mod indicator_table;
pub mod summary;

use chrono::Local;
use kpi_core::status::Status;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Mode};

/// Foreground colour for a status.
pub fn status_color(status: Status) -> Color {
  match status {
    Status::Green => Color::Green,
    Status::Red => Color::Red,
    Status::NotApplicable => Color::DarkGray,
  }
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let year = app
    .client
    .year()
    .map_or_else(|| "current".to_string(), |y| y.to_string());
  let kind = app
    .kind_filter
    .map_or_else(|| "all".to_string(), |k| k.to_string());

  let left = Span::styled(
    " KPI / KRI / KCI dashboard",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let middle = Span::styled(
    format!("  year: {year}  kind: {kind}"),
    Style::default().fg(Color::Gray),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let used = (left.content.len() + middle.content.len() + right.content.len()) as u16;
  let pad = area.width.saturating_sub(used);

  let line = Line::from(vec![
    left,
    middle,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
    .split(area);

  indicator_table::draw(f, cols[0], app);
  summary::draw(f, cols[1], app);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match &app.mode {
    Mode::Search => ("SEARCH", "Type to filter  Esc cancel  Enter keep"),
    Mode::ConfirmDelete(_) => ("DELETE", "y confirm  any other key cancels"),
    Mode::Normal => (
      "NORMAL",
      "↑↓/jk move  / search  t kind  d delete  r reload  s save  g refresh  q quit",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
