//! On-disk row shape.
//!
//! Column names are the record's field names. The reader also accepts the
//! headers of the legacy spreadsheet export (`Jenis`, `Nama_Indikator`,
//! ...), so older files load unchanged.

use kpi_core::record::RawRow;
use serde::{Deserialize, Serialize};

/// Header row written at the top of every file, in column order.
pub(crate) const HEADERS: [&str; 14] = [
  "kind",
  "name",
  "category",
  "unit_name",
  "owner",
  "observed_on",
  "target",
  "actual",
  "unit_of_measure",
  "notes",
  "direction",
  "target_min",
  "target_max",
  "status",
];

/// A CSV line. Empty cells read as `None`; unknown columns are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct CsvRow {
  #[serde(alias = "Jenis")]
  kind:            Option<String>,
  #[serde(alias = "Nama_Indikator")]
  name:            Option<String>,
  #[serde(alias = "Kategori")]
  category:        Option<String>,
  #[serde(alias = "Unit")]
  unit_name:       Option<String>,
  #[serde(alias = "Pemilik")]
  owner:           Option<String>,
  #[serde(alias = "Tanggal")]
  observed_on:     Option<String>,
  #[serde(alias = "Target")]
  target:          Option<String>,
  #[serde(alias = "Realisasi")]
  actual:          Option<String>,
  #[serde(alias = "Satuan")]
  unit_of_measure: Option<String>,
  #[serde(alias = "Keterangan")]
  notes:           Option<String>,
  #[serde(alias = "Arah")]
  direction:       Option<String>,
  #[serde(alias = "Target_Min")]
  target_min:      Option<String>,
  #[serde(alias = "Target_Max")]
  target_max:      Option<String>,
  #[serde(alias = "Status")]
  status:          Option<String>,
}

impl From<CsvRow> for RawRow {
  fn from(row: CsvRow) -> Self {
    RawRow {
      kind:            row.kind,
      name:            row.name,
      category:        row.category,
      unit_name:       row.unit_name,
      owner:           row.owner,
      observed_on:     row.observed_on,
      target:          row.target,
      actual:          row.actual,
      unit_of_measure: row.unit_of_measure,
      notes:           row.notes,
      direction:       row.direction,
      target_min:      row.target_min,
      target_max:      row.target_max,
      status:          row.status,
    }
  }
}

impl From<RawRow> for CsvRow {
  fn from(row: RawRow) -> Self {
    CsvRow {
      kind:            row.kind,
      name:            row.name,
      category:        row.category,
      unit_name:       row.unit_name,
      owner:           row.owner,
      observed_on:     row.observed_on,
      target:          row.target,
      actual:          row.actual,
      unit_of_measure: row.unit_of_measure,
      notes:           row.notes,
      direction:       row.direction,
      target_min:      row.target_min,
      target_max:      row.target_max,
      status:          row.status,
    }
  }
}
