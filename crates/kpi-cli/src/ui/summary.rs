//! Summary pane: right panel with counters and the green ratio.

use kpi_core::{record::IndicatorKind, status::Status};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Gauge, Paragraph},
};
use strum::IntoEnumIterator as _;

use super::status_color;
use crate::app::App;

/// Render the summary pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let summary = &app.summary;

  let block = Block::default()
    .title(" Summary ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let parts = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(2), Constraint::Min(0)])
    .split(inner);

  f.render_widget(
    Gauge::default()
      .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
      .ratio(summary.green_ratio.clamp(0.0, 1.0))
      .label(format!("{:.1}% green", summary.green_percent())),
    parts[0],
  );

  let label = Style::default().add_modifier(Modifier::BOLD);
  let mut lines = vec![Line::from(vec![
    Span::styled(format!("{:<10}", "Total"), label),
    Span::raw(summary.total.to_string()),
  ])];

  for status in Status::ALL {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", status.label()), label.fg(status_color(status))),
      Span::raw(summary.count(status).to_string()),
    ]));
  }

  lines.push(Line::from(""));
  for kind in IndicatorKind::iter() {
    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", kind.to_string()), label),
      Span::raw(summary.kinds.get(kind).to_string()),
    ]));
  }

  f.render_widget(Paragraph::new(lines), parts[1]);
}
