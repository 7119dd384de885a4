//! Tests for `CsvStore` against a temporary directory.

use kpi_core::{
  record::{Direction, IndicatorKind, IndicatorRecord, Measure, RawRow},
  status::Status,
  store::{IndicatorStore, Partition},
  table::Dataset,
};
use tempfile::TempDir;

use crate::CsvStore;

async fn store() -> (TempDir, CsvStore) {
  let dir = tempfile::tempdir().expect("temp dir");
  let store = CsvStore::open(dir.path().join("data"), "kpi_kri_kci_data")
    .await
    .expect("open store");
  (dir, store)
}

fn revenue() -> IndicatorRecord {
  let mut r = IndicatorRecord::named("Revenue, gross");
  r.kind = Some(IndicatorKind::Kpi);
  r.category = "Finance".into();
  r.unit_name = "Mining".into();
  r.owner = "CFO".into();
  r.observed_on = chrono::NaiveDate::from_ymd_opt(2024, 3, 31);
  r.target = Some(12.0.into());
  r.actual = Some(13.5.into());
  r.unit_of_measure = "IDR bn".into();
  r.notes = Some("line one\nline two".into());
  r.direction = Some(Direction::HigherIsBetter);
  r
}

// ─── Load / save ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_partition_loads_empty() {
  let (_dir, s) = store().await;
  let rows = s.load_all(Partition::All).await.unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn save_then_load_round_trips_a_dataset() {
  let (_dir, s) = store().await;

  let mut range = IndicatorRecord::named("Temperature");
  range.direction = Some(Direction::Range);
  range.actual = Some(95.0.into());
  range.target_min = Some(90.0.into());
  range.target_max = Some(100.0.into());

  let ds = Dataset::default()
    .add(revenue())
    .dataset
    .add(range.clone())
    .dataset;
  s.save_all(Partition::All, ds.to_raw_rows()).await.unwrap();

  let loaded = Dataset::load(s.load_all(Partition::All).await.unwrap());
  assert_eq!(loaded.len(), 2);
  assert_eq!(loaded.rows()[0].record(), &revenue());
  assert_eq!(loaded.rows()[0].status(), Status::Green);
  assert_eq!(loaded.rows()[1].record(), &range);
}

#[tokio::test]
async fn save_overwrites_previous_contents() {
  let (_dir, s) = store().await;
  let ds = Dataset::default().add(revenue()).dataset;
  s.save_all(Partition::All, ds.to_raw_rows()).await.unwrap();

  s.save_all(Partition::All, Vec::new()).await.unwrap();
  let rows = s.load_all(Partition::All).await.unwrap();
  assert!(rows.is_empty());

  let text = std::fs::read_to_string(s.path_for(Partition::All)).unwrap();
  assert!(text.starts_with("kind,name,category"), "header missing: {text}");
}

#[tokio::test]
async fn stored_status_column_is_written_but_not_trusted() {
  let (_dir, s) = store().await;
  let ds = Dataset::default().add(revenue()).dataset;
  let mut rows = ds.to_raw_rows();
  assert_eq!(rows[0].status.as_deref(), Some("Green"));
  rows[0].status = Some("Red".into());
  s.save_all(Partition::All, rows).await.unwrap();

  let loaded = Dataset::load(s.load_all(Partition::All).await.unwrap());
  assert_eq!(loaded.rows()[0].status(), Status::Green);
}

// ─── Legacy files ────────────────────────────────────────────────────────────

#[tokio::test]
async fn reads_legacy_spreadsheet_headers() {
  let (_dir, s) = store().await;
  let legacy = "\
Jenis,Nama_Indikator,Kategori,Unit,Pemilik,Tanggal,Target,Realisasi,Satuan,Keterangan,Arah,Target_Min,Target_Max,Status
KPI,Revenue,Finance,Mining,CFO,2024-01-31,12.0,13.5,IDR bn,,Higher is Better,,,Merah
KRI,,Safety,Mining,HSE,2024-01-31,2.0,3.0,cases,,Lower is Better,,,
KCI,Audit findings,Control,Refinery,IA,2024-02-29,,N/A,items,,Lower is Better,,,
KPI,Temperature,Ops,Refinery,COO,2024-02-29,0.0,95,C,,Range,90.0,100.0,
KPI,nan,Ops,Refinery,COO,2024-02-29,0.0,95,C,,Range,90.0,100.0,
";
  std::fs::write(s.path_for(Partition::All), legacy).unwrap();

  let raw = s.load_all(Partition::All).await.unwrap();
  assert_eq!(raw.len(), 5);
  assert_eq!(raw[1].name, None);

  let ds = Dataset::load(raw);
  let got: Vec<_> = ds.iter().map(|r| (r.name(), r.status())).collect();
  assert_eq!(got, vec![
    ("Revenue", Status::Green),
    ("Audit findings", Status::NotApplicable),
    ("Temperature", Status::Green),
  ]);
  assert_eq!(ds.rows()[0].record().actual, Some(Measure::Number(13.5)));
}

#[tokio::test]
async fn tolerates_short_rows_and_extra_columns() {
  let (_dir, s) = store().await;
  let text = "\
index,name,actual,target,extra
0,Uptime,99.5,99
1,Latency,120,100,ignored
";
  std::fs::write(s.path_for(Partition::All), text).unwrap();

  let rows = s.load_all(Partition::All).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0], RawRow {
    name: Some("Uptime".into()),
    actual: Some("99.5".into()),
    target: Some("99".into()),
    ..RawRow::default()
  });
}

#[tokio::test]
async fn bad_bytes_in_one_row_keep_the_rest_of_the_file() {
  let (_dir, s) = store().await;
  let text: &[u8] = b"kind,name,target,actual\nKPI,Uptime,98,99\nKRI,Caf\xe9 incidents,1,0\n";
  std::fs::write(s.path_for(Partition::All), text).unwrap();

  let rows = s.load_all(Partition::All).await.unwrap();
  let names: Vec<_> = rows.iter().map(|r| r.name.as_deref()).collect();
  assert_eq!(names, vec![Some("Uptime"), Some("Caf\u{FFFD} incidents")]);

  let ds = Dataset::load(rows);
  assert_eq!(ds.rows()[0].status(), Status::Green);
  assert_eq!(ds.rows()[1].status(), Status::Red);
}

// ─── Partitions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn yearly_partitions_use_separate_files() {
  let (_dir, s) = store().await;
  let ds = Dataset::default().add(revenue()).dataset;
  s.save_all(Partition::Year(2024), ds.to_raw_rows()).await.unwrap();
  s.save_all(Partition::Year(2023), Vec::new()).await.unwrap();

  assert!(s.path_for(Partition::Year(2024)).ends_with("kpi_kri_kci_data_2024.csv"));
  assert_eq!(s.load_all(Partition::Year(2024)).await.unwrap().len(), 1);
  assert!(s.load_all(Partition::Year(2023)).await.unwrap().is_empty());
  assert!(s.load_all(Partition::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn partitions_lists_only_our_files() {
  let (_dir, s) = store().await;
  s.save_all(Partition::Year(2024), Vec::new()).await.unwrap();
  s.save_all(Partition::All, Vec::new()).await.unwrap();
  s.save_all(Partition::Year(2022), Vec::new()).await.unwrap();
  std::fs::write(s.dir().join("notes.txt"), "x").unwrap();
  std::fs::write(s.dir().join("kpi_kri_kci_data_draft.csv"), "x").unwrap();

  let partitions = s.partitions().await.unwrap();
  assert_eq!(partitions, vec![
    Partition::All,
    Partition::Year(2022),
    Partition::Year(2024),
  ]);
}
