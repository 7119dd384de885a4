//! Indicator table pane: left panel, one line per row coloured by status.

use kpi_core::{record::Measure, table::EvaluatedIndicator};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use super::status_color;
use crate::app::{App, Mode};

const WIDTHS: [Constraint; 7] = [
  Constraint::Length(4),  // kind
  Constraint::Min(18),    // name
  Constraint::Length(14), // unit
  Constraint::Length(10), // date
  Constraint::Length(9),  // target
  Constraint::Length(9),  // actual
  Constraint::Length(6),  // status
];

/// Render the indicator table into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let visible = app.visible_rows();
  let total = app.rows.len();

  let title = if app.search.is_empty() {
    format!(" Indicators ({total}) ")
  } else {
    format!(" Indicators ({}/{total}) ", visible.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Search bar on the last inner line while a query is active or set.
  if (app.mode == Mode::Search || !app.search.is_empty()) && inner_area.height > 2 {
    let search_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let search_text = if app.mode == Mode::Search {
      format!("/{}_", app.search)
    } else {
      format!("/{}", app.search)
    };
    f.render_widget(
      Paragraph::new(search_text).style(Style::default().fg(Color::Yellow)),
      search_area,
    );
  }

  if visible.is_empty() {
    f.render_widget(
      Paragraph::new("No indicators.").style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  let header = Row::new(["Kind", "Name", "Unit", "Date", "Target", "Actual", "Status"])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
  let rows: Vec<Row> = visible.iter().map(|row| table_row(row)).collect();

  let mut state = TableState::default().with_selected(Some(app.cursor));
  f.render_stateful_widget(
    Table::new(rows, WIDTHS)
      .header(header)
      .row_highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD)),
    inner_area,
    &mut state,
  );
}

fn table_row(row: &EvaluatedIndicator) -> Row<'static> {
  let r = row.record();
  let color = status_color(row.status());
  Row::new(vec![
    Cell::from(r.kind.map(|k| k.to_string()).unwrap_or_default()),
    Cell::from(r.name.clone()),
    Cell::from(r.unit_name.clone()),
    Cell::from(
      r.observed_on
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default(),
    ),
    Cell::from(measure(r.target.as_ref())),
    Cell::from(measure(r.actual.as_ref())),
    Cell::from(row.status().label()),
  ])
  .style(Style::default().fg(color))
}

fn measure(m: Option<&Measure>) -> String {
  m.map(ToString::to_string).unwrap_or_default()
}
