//! `GET /export.xlsx`: the filtered table as an Excel workbook.
//!
//! One sheet named `Dashboard` with a bold header row and one row per record.
//! Each data row is filled with its status colour.

use axum::{
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use kpi_core::{
  record::Measure,
  status::Status,
  store::IndicatorStore,
  table::EvaluatedIndicator,
};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use crate::{error::ApiError, params::FilterParams, state::AppState};

pub const SHEET_NAME: &str = "Dashboard";
pub const FILE_NAME: &str = "kpi_kri_kci_export.xlsx";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const COLUMNS: [&str; 14] = [
  "Kind",
  "Name",
  "Category",
  "Unit",
  "Owner",
  "Date",
  "Target",
  "Actual",
  "Unit of Measure",
  "Notes",
  "Direction",
  "Target Min",
  "Target Max",
  "Status",
];

/// Row fill per status.
pub fn fill(status: Status) -> Color {
  match status {
    Status::Green => Color::RGB(0xC8F7C5),
    Status::Red => Color::RGB(0xF7C5C5),
    Status::NotApplicable => Color::RGB(0xE0E0E0),
  }
}

/// `GET /export.xlsx[?year=...][&kind=...]...`
pub async fn handler<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  if let Some(warning) = &locked.warning {
    tracing::warn!(%warning, "exporting a partition that failed to load");
  }
  let bytes = render(filter.apply(locked.dataset()))?;
  drop(locked);

  let disposition = format!("attachment; filename=\"{FILE_NAME}\"");
  Ok((
    [
      (header::CONTENT_TYPE, XLSX_MIME.to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    bytes,
  ))
}

/// Build the workbook in memory.
pub fn render<'a>(
  rows: impl IntoIterator<Item = &'a EvaluatedIndicator>,
) -> Result<Vec<u8>, XlsxError> {
  let mut workbook = Workbook::new();
  let sheet = workbook.add_worksheet();
  sheet.set_name(SHEET_NAME)?;

  let header = Format::new().set_bold();
  for (col, title) in (0u16..).zip(COLUMNS) {
    sheet.write_string_with_format(0, col, title, &header)?;
  }

  for (row, indicator) in (1u32..).zip(rows) {
    let format = Format::new().set_background_color(fill(indicator.status()));
    write_row(sheet, row, indicator, &format)?;
  }

  sheet.set_column_width(1, 32)?;
  sheet.set_column_width(9, 40)?;
  workbook.save_to_buffer()
}

fn write_row(
  sheet: &mut Worksheet,
  row: u32,
  indicator: &EvaluatedIndicator,
  format: &Format,
) -> Result<(), XlsxError> {
  let r = indicator.record();
  let text = |s: &str| s.to_owned();
  let cells: [Cell; 14] = [
    Cell::Text(r.kind.map(|k| k.to_string()).unwrap_or_default()),
    Cell::Text(text(&r.name)),
    Cell::Text(text(&r.category)),
    Cell::Text(text(&r.unit_name)),
    Cell::Text(text(&r.owner)),
    Cell::Text(
      r.observed_on
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default(),
    ),
    Cell::measure(r.target.as_ref()),
    Cell::measure(r.actual.as_ref()),
    Cell::Text(text(&r.unit_of_measure)),
    Cell::Text(r.notes.clone().unwrap_or_default()),
    Cell::Text(r.direction.as_ref().map(|d| d.to_string()).unwrap_or_default()),
    Cell::measure(r.target_min.as_ref()),
    Cell::measure(r.target_max.as_ref()),
    Cell::Text(indicator.status().label().to_owned()),
  ];

  for (col, cell) in (0u16..).zip(cells) {
    match cell {
      Cell::Number(n) => sheet.write_number_with_format(row, col, n, format)?,
      Cell::Text(s) => sheet.write_string_with_format(row, col, &s, format)?,
    };
  }
  Ok(())
}

enum Cell {
  Number(f64),
  Text(String),
}

impl Cell {
  /// Numbers stay numeric in the sheet; anything else is written as typed.
  fn measure(m: Option<&Measure>) -> Self {
    match m {
      Some(m) => match m.as_number() {
        Some(n) => Self::Number(n),
        None => Self::Text(m.to_string()),
      },
      None => Self::Text(String::new()),
    }
  }
}

#[cfg(test)]
mod tests {
  use kpi_core::{record::IndicatorRecord, table::Dataset};

  use super::*;

  #[test]
  fn renders_a_workbook_for_mixed_statuses() {
    let mut green = IndicatorRecord::named("Revenue");
    green.target = Some(12.0.into());
    green.actual = Some(13.5.into());
    let mut na = IndicatorRecord::named("Audit findings");
    na.actual = Some("N/A".into());

    let ds = Dataset::default().add(green).dataset.add(na).dataset;
    let bytes = render(&ds).unwrap();
    // xlsx files are zip archives.
    assert_eq!(&bytes[..2], b"PK");
  }

  #[test]
  fn empty_selection_still_has_a_header_row() {
    let bytes = render(&Dataset::default()).unwrap();
    assert!(!bytes.is_empty());
  }

  #[test]
  fn fills_follow_status() {
    assert_eq!(fill(Status::Green), Color::RGB(0xC8F7C5));
    assert_eq!(fill(Status::Red), Color::RGB(0xF7C5C5));
    assert_eq!(fill(Status::NotApplicable), Color::RGB(0xE0E0E0));
  }
}
