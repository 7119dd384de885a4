//! [`CsvStore`]: the CSV file implementation of [`IndicatorStore`].

use std::{
  fs::File,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use kpi_core::{
  record::RawRow,
  store::{IndicatorStore, Partition},
};

use crate::{
  Error, Result,
  encode::{CsvRow, HEADERS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An indicator store backed by CSV files in one directory.
///
/// Cloning is cheap: the location is reference-counted.
#[derive(Debug, Clone)]
pub struct CsvStore {
  inner: Arc<Location>,
}

#[derive(Debug)]
struct Location {
  dir:       PathBuf,
  file_stem: String,
}

impl CsvStore {
  /// Open (or create) a store rooted at `dir`. Files are named after
  /// `file_stem`.
  pub async fn open(dir: impl AsRef<Path>, file_stem: impl Into<String>) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(Error::io(&dir))?;
    Ok(Self {
      inner: Arc::new(Location { dir, file_stem: file_stem.into() }),
    })
  }

  pub fn dir(&self) -> &Path { &self.inner.dir }

  /// The file holding `partition`.
  pub fn path_for(&self, partition: Partition) -> PathBuf {
    let file = match partition {
      Partition::All => format!("{}.csv", self.inner.file_stem),
      Partition::Year(year) => format!("{}_{year}.csv", self.inner.file_stem),
    };
    self.inner.dir.join(file)
  }

  /// Map a file name back to its partition, if it is one of ours.
  fn partition_of(&self, file_name: &str) -> Option<Partition> {
    let stem = file_name.strip_suffix(".csv")?;
    if stem == self.inner.file_stem {
      return Some(Partition::All);
    }
    let year = stem
      .strip_prefix(self.inner.file_stem.as_str())?
      .strip_prefix('_')?;
    if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    year.parse().ok().map(Partition::Year)
  }
}

// ─── Blocking helpers ────────────────────────────────────────────────────────

fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
  let file = match File::open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(Error::io(path)(e)),
  };

  let mut reader = ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(Trim::All)
    .from_reader(file);

  // Legacy exports are not always UTF-8: undecodable bytes become U+FFFD
  // and a row that still cannot be read is skipped, not the whole file.
  let headers = reader.byte_headers().map_err(Error::csv(path))?.clone();
  let headers = StringRecord::from_byte_record_lossy(headers);

  let mut rows = Vec::new();
  for record in reader.byte_records() {
    let record = record.map_err(Error::csv(path))?;
    let line = record.position().map_or(0, |p| p.line());
    if std::str::from_utf8(record.as_slice()).is_err() {
      tracing::warn!(path = %path.display(), line, "row is not valid UTF-8; replacing bad bytes");
    }
    match StringRecord::from_byte_record_lossy(record).deserialize::<CsvRow>(Some(&headers)) {
      Ok(row) => rows.push(RawRow::from(row)),
      Err(e) => tracing::warn!(path = %path.display(), line, error = %e, "skipping unreadable row"),
    }
  }
  Ok(rows)
}

/// Write to a sibling temp file, then rename over the target so readers never
/// see a half-written table.
fn write_rows(path: &Path, rows: Vec<RawRow>) -> Result<()> {
  let tmp = path.with_extension("csv.tmp");
  {
    let mut writer = WriterBuilder::new()
      .has_headers(false)
      .from_path(&tmp)
      .map_err(Error::csv(&tmp))?;
    writer.write_record(HEADERS).map_err(Error::csv(&tmp))?;
    for row in rows {
      writer.serialize(CsvRow::from(row)).map_err(Error::csv(&tmp))?;
    }
    writer.flush().map_err(Error::io(&tmp))?;
  }
  std::fs::rename(&tmp, path).map_err(Error::io(path))?;
  Ok(())
}

// ─── IndicatorStore impl ─────────────────────────────────────────────────────

impl IndicatorStore for CsvStore {
  type Error = Error;

  async fn load_all(&self, partition: Partition) -> Result<Vec<RawRow>> {
    let path = self.path_for(partition);
    let rows = tokio::task::spawn_blocking({
      let path = path.clone();
      move || read_rows(&path)
    })
    .await??;
    tracing::info!(%partition, path = %path.display(), rows = rows.len(), "loaded indicators");
    Ok(rows)
  }

  async fn save_all(&self, partition: Partition, rows: Vec<RawRow>) -> Result<()> {
    let path = self.path_for(partition);
    let count = rows.len();
    tokio::task::spawn_blocking({
      let path = path.clone();
      move || write_rows(&path, rows)
    })
    .await??;
    tracing::info!(%partition, path = %path.display(), rows = count, "saved indicators");
    Ok(())
  }

  async fn partitions(&self) -> Result<Vec<Partition>> {
    let dir = self.inner.dir.clone();
    let mut entries = tokio::fs::read_dir(&dir).await.map_err(Error::io(&dir))?;
    let mut partitions = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(Error::io(&dir))? {
      if let Some(partition) = entry.file_name().to_str().and_then(|n| self.partition_of(n)) {
        partitions.push(partition);
      }
    }
    partitions.sort();
    Ok(partitions)
  }
}
