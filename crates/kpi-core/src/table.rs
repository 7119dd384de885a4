//! The indicator table: an owned, ordered collection of evaluated records.
//!
//! Every mutation consumes the current [`Dataset`] and hands back the next
//! version inside a [`Mutation`], together with an outcome the caller can
//! report. A failed mutation returns the dataset unchanged.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use thiserror::Error;

use crate::{
  record::{IndicatorKind, IndicatorPatch, IndicatorRecord, RawRow, is_placeholder_name},
  status::{Status, evaluate},
};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A record bundled with the status derived from it.
///
/// Inside the table the status is only set by evaluation, so it cannot drift
/// from the record. Deserialised rows (e.g. an API response) carry whatever
/// status the sender computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedIndicator {
  #[serde(flatten)]
  record: IndicatorRecord,
  status: Status,
}

impl EvaluatedIndicator {
  pub fn new(record: IndicatorRecord) -> Self {
    let status = evaluate(&record);
    Self { record, status }
  }

  pub fn record(&self) -> &IndicatorRecord { &self.record }

  pub fn status(&self) -> Status { self.status }

  pub fn name(&self) -> &str { &self.record.name }

  pub fn into_record(self) -> IndicatorRecord { self.record }

  fn reevaluate(&mut self) { self.status = evaluate(&self.record); }

  /// The storage shape of this row, with the derived status filled in.
  pub fn to_raw_row(&self) -> RawRow {
    let r = &self.record;
    RawRow {
      kind:            r.kind.map(|k| k.to_string()),
      name:            Some(r.name.clone()),
      category:        Some(r.category.clone()),
      unit_name:       Some(r.unit_name.clone()),
      owner:           Some(r.owner.clone()),
      observed_on:     r.observed_on.map(|d| d.format("%Y-%m-%d").to_string()),
      target:          r.target.as_ref().map(ToString::to_string),
      actual:          r.actual.as_ref().map(ToString::to_string),
      unit_of_measure: Some(r.unit_of_measure.clone()),
      notes:           r.notes.clone(),
      direction:       r.direction.as_ref().map(ToString::to_string),
      target_min:      r.target_min.as_ref().map(ToString::to_string),
      target_max:      r.target_max.as_ref().map(ToString::to_string),
      status:          Some(self.status.label().to_owned()),
    }
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Whether `add` may append a row whose name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
  /// Repeated names form an observation history (e.g. one row per month).
  #[default]
  Allow,
  /// Names are unique keys; adding an existing name fails.
  Reject,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A mutation that took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
  Added,
  Updated,
  Deleted { removed: usize },
  Cleared { removed: usize },
}

/// A mutation that was refused. The dataset is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
  #[error("indicator not found: {0:?}")]
  NotFound(String),

  #[error("indicator already exists: {0:?}")]
  DuplicateName(String),

  #[error("indicator name must not be blank")]
  BlankName,
}

/// The next version of a dataset plus what happened to it.
#[must_use]
#[derive(Debug, Clone)]
pub struct Mutation {
  pub dataset: Dataset,
  pub outcome: Result<Change, TableError>,
}

impl Mutation {
  fn applied(dataset: Dataset, change: Change) -> Self {
    tracing::debug!(?change, rows = dataset.len(), "dataset mutated");
    Self { dataset, outcome: Ok(change) }
  }

  fn refused(dataset: Dataset, error: TableError) -> Self {
    tracing::debug!(%error, "dataset mutation refused");
    Self { dataset, outcome: Err(error) }
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Row counts per indicator kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
  pub kpi: usize,
  pub kri: usize,
  pub kci: usize,
}

impl KindCounts {
  pub fn get(&self, kind: IndicatorKind) -> usize {
    match kind {
      IndicatorKind::Kpi => self.kpi,
      IndicatorKind::Kri => self.kri,
      IndicatorKind::Kci => self.kci,
    }
  }

  fn bump(&mut self, kind: IndicatorKind) {
    match kind {
      IndicatorKind::Kpi => self.kpi += 1,
      IndicatorKind::Kri => self.kri += 1,
      IndicatorKind::Kci => self.kci += 1,
    }
  }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub total:       usize,
  pub green_count: usize,
  pub red_count:   usize,
  pub na_count:    usize,
  /// `green_count / total`, or `0` for an empty set.
  pub green_ratio: f64,
  pub kinds:       KindCounts,
}

impl Summary {
  /// Aggregate any set of rows, e.g. a filtered view.
  pub fn of<'a>(rows: impl IntoIterator<Item = &'a EvaluatedIndicator>) -> Self {
    let mut summary = Self::default();
    for row in rows {
      summary.total += 1;
      match row.status {
        Status::Green => summary.green_count += 1,
        Status::Red => summary.red_count += 1,
        Status::NotApplicable => summary.na_count += 1,
      }
      if let Some(kind) = row.record.kind {
        summary.kinds.bump(kind);
      }
    }
    if summary.total > 0 {
      summary.green_ratio = summary.green_count as f64 / summary.total as f64;
    }
    summary
  }

  pub fn green_percent(&self) -> f64 { self.green_ratio * 100.0 }

  pub fn count(&self, status: Status) -> usize {
    match status {
      Status::Green => self.green_count,
      Status::Red => self.red_count,
      Status::NotApplicable => self.na_count,
    }
  }
}

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// The rows of one partition, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
  rows:   Vec<EvaluatedIndicator>,
  policy: DuplicatePolicy,
}

impl Dataset {
  /// An empty table with the default policy.
  pub const EMPTY: Dataset = Dataset { rows: Vec::new(), policy: DuplicatePolicy::Allow };

  pub fn new(policy: DuplicatePolicy) -> Self {
    Self { rows: Vec::new(), policy }
  }

  /// Build a dataset from storage rows.
  ///
  /// Rows without a usable name (missing, blank, or the `nan` placeholder)
  /// are dropped without error. Every surviving row is evaluated afresh; a stored
  /// status is ignored.
  pub fn load(rows: impl IntoIterator<Item = RawRow>) -> Self {
    let mut dropped = 0usize;
    let rows: Vec<EvaluatedIndicator> = rows
      .into_iter()
      .filter_map(|raw| {
        let record = raw.into_record();
        if record.is_none() {
          dropped += 1;
        }
        record
      })
      .map(EvaluatedIndicator::new)
      .collect();

    if dropped > 0 {
      tracing::warn!(dropped, "skipped rows without an indicator name");
    }
    Self { rows, policy: DuplicatePolicy::default() }
  }

  pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> DuplicatePolicy { self.policy }

  pub fn rows(&self) -> &[EvaluatedIndicator] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn iter(&self) -> std::slice::Iter<'_, EvaluatedIndicator> { self.rows.iter() }

  pub fn contains(&self, name: &str) -> bool {
    self.rows.iter().any(|r| r.record.name == name)
  }

  /// First row with this name.
  pub fn get(&self, name: &str) -> Option<&EvaluatedIndicator> {
    self.rows.iter().find(|r| r.record.name == name)
  }

  /// Distinct names in first-seen order.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for row in &self.rows {
      if !names.contains(&row.name()) {
        names.push(row.name());
      }
    }
    names
  }

  /// Append `record`, evaluating only the new row.
  ///
  /// Blank and placeholder names are refused, since `load` would drop them.
  pub fn add(mut self, record: IndicatorRecord) -> Mutation {
    if is_placeholder_name(&record.name) {
      return Mutation::refused(self, TableError::BlankName);
    }
    if self.policy == DuplicatePolicy::Reject && self.contains(&record.name) {
      let name = record.name;
      return Mutation::refused(self, TableError::DuplicateName(name));
    }
    self.rows.push(EvaluatedIndicator::new(record));
    Mutation::applied(self, Change::Added)
  }

  /// Patch the first row named `key` in place and re-evaluate it.
  pub fn update(mut self, key: &str, patch: IndicatorPatch) -> Mutation {
    let Some(index) = self.rows.iter().position(|r| r.record.name == key) else {
      return Mutation::refused(self, TableError::NotFound(key.to_owned()));
    };

    if let Some(new_name) = patch.name.as_deref() {
      if is_placeholder_name(new_name) {
        return Mutation::refused(self, TableError::BlankName);
      }
      if self.policy == DuplicatePolicy::Reject && new_name != key && self.contains(new_name) {
        let name = new_name.to_owned();
        return Mutation::refused(self, TableError::DuplicateName(name));
      }
    }

    let row = &mut self.rows[index];
    patch.apply_to(&mut row.record);
    row.reevaluate();
    Mutation::applied(self, Change::Updated)
  }

  /// Remove every row named `key`.
  pub fn delete(mut self, key: &str) -> Mutation {
    let before = self.rows.len();
    self.rows.retain(|r| r.record.name != key);
    let removed = before - self.rows.len();
    if removed == 0 {
      return Mutation::refused(self, TableError::NotFound(key.to_owned()));
    }
    Mutation::applied(self, Change::Deleted { removed })
  }

  /// Drop every row, keeping the policy.
  pub fn clear(mut self) -> Mutation {
    let removed = self.rows.len();
    self.rows.clear();
    Mutation::applied(self, Change::Cleared { removed })
  }

  pub fn summarize(&self) -> Summary { Summary::of(&self.rows) }

  /// The snapshot handed to a storage backend.
  pub fn to_raw_rows(&self) -> Vec<RawRow> {
    self.rows.iter().map(EvaluatedIndicator::to_raw_row).collect()
  }

  /// Every kind that appears in the table, in declaration order.
  pub fn kinds_present(&self) -> Vec<IndicatorKind> {
    IndicatorKind::iter()
      .filter(|k| self.rows.iter().any(|r| r.record.kind == Some(*k)))
      .collect()
  }
}

impl<'a> IntoIterator for &'a Dataset {
  type Item = &'a EvaluatedIndicator;
  type IntoIter = std::slice::Iter<'a, EvaluatedIndicator>;

  fn into_iter(self) -> Self::IntoIter { self.rows.iter() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Direction, Measure};

  fn indicator(name: &str, actual: f64, target: f64) -> IndicatorRecord {
    let mut r = IndicatorRecord::named(name);
    r.kind = Some(IndicatorKind::Kpi);
    r.actual = Some(actual.into());
    r.target = Some(target.into());
    r.direction = Some(Direction::HigherIsBetter);
    r
  }

  fn raw(name: Option<&str>) -> RawRow {
    RawRow {
      name: name.map(str::to_owned),
      actual: Some("5".into()),
      target: Some("4".into()),
      ..RawRow::default()
    }
  }

  // ── Load ──────────────────────────────────────────────────────────────────

  #[test]
  fn load_drops_placeholder_names() {
    let ds = Dataset::load(vec![
      raw(Some("")),
      raw(Some("Revenue")),
      raw(None),
      raw(Some("nan")),
      raw(Some("   ")),
    ]);
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.rows()[0].name(), "Revenue");
  }

  #[test]
  fn load_recomputes_status_ignoring_stored_value() {
    let mut row = raw(Some("Revenue"));
    row.status = Some("Red".into());
    let ds = Dataset::load(vec![row]);
    assert_eq!(ds.rows()[0].status(), Status::Green);
  }

  // ── Add ───────────────────────────────────────────────────────────────────

  #[test]
  fn add_appends_and_evaluates() {
    let Mutation { dataset, outcome } =
      Dataset::default().add(indicator("Revenue", 13.5, 12.0));
    assert_eq!(outcome, Ok(Change::Added));
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.rows()[0].status(), Status::Green);
  }

  #[test]
  fn add_allows_duplicates_by_default() {
    let ds = Dataset::default()
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset
      .add(indicator("Revenue", 3.0, 2.0))
      .dataset;
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.rows()[0].status(), Status::Red);
    assert_eq!(ds.rows()[1].status(), Status::Green);
  }

  #[test]
  fn add_rejects_duplicates_in_reject_mode() {
    let ds = Dataset::new(DuplicatePolicy::Reject)
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset;
    let Mutation { dataset, outcome } = ds.add(indicator("Revenue", 3.0, 2.0));
    assert_eq!(outcome, Err(TableError::DuplicateName("Revenue".into())));
    assert_eq!(dataset.len(), 1);
  }

  #[test]
  fn add_refuses_names_load_would_drop() {
    for name in ["", "   ", "nan", "NaN"] {
      let Mutation { dataset, outcome } =
        Dataset::default().add(IndicatorRecord::named(name));
      assert_eq!(outcome, Err(TableError::BlankName), "name {name:?}");
      assert!(dataset.is_empty());
    }
  }

  // ── Update ────────────────────────────────────────────────────────────────

  #[test]
  fn update_patches_first_match_and_reevaluates() {
    let ds = Dataset::default()
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset;

    let patch = IndicatorPatch { actual: Some(Measure::Number(5.0)), ..Default::default() };
    let Mutation { dataset, outcome } = ds.update("Revenue", patch);
    assert_eq!(outcome, Ok(Change::Updated));
    assert_eq!(dataset.rows()[0].status(), Status::Green);
    assert_eq!(dataset.rows()[1].status(), Status::Red);
  }

  #[test]
  fn update_switching_to_range_uses_bounds() {
    let ds = Dataset::default().add(indicator("Temp", 95.0, 200.0)).dataset;
    let patch = IndicatorPatch {
      direction: Some(Direction::Range),
      target_min: Some(Some(90.0.into())),
      target_max: Some(Some(100.0.into())),
      ..Default::default()
    };
    let dataset = ds.update("Temp", patch).dataset;
    assert_eq!(dataset.rows()[0].status(), Status::Green);
  }

  #[test]
  fn update_missing_key_reports_not_found() {
    let ds = Dataset::default().add(indicator("Revenue", 1.0, 2.0)).dataset;
    let before = ds.rows().to_vec();
    let Mutation { dataset, outcome } = ds.update("Ghost", IndicatorPatch::default());
    assert_eq!(outcome, Err(TableError::NotFound("Ghost".into())));
    assert_eq!(dataset.rows(), before.as_slice());
  }

  #[test]
  fn update_rename_onto_existing_name_is_refused_in_reject_mode() {
    let ds = Dataset::new(DuplicatePolicy::Reject)
      .add(indicator("A", 1.0, 2.0))
      .dataset
      .add(indicator("B", 1.0, 2.0))
      .dataset;
    let patch = IndicatorPatch { name: Some("B".into()), ..Default::default() };
    let Mutation { dataset, outcome } = ds.update("A", patch);
    assert_eq!(outcome, Err(TableError::DuplicateName("B".into())));
    assert!(dataset.contains("A"));
  }

  #[test]
  fn update_missing_key_wins_over_duplicate_rename() {
    let ds = Dataset::new(DuplicatePolicy::Reject).add(indicator("B", 1.0, 2.0)).dataset;
    let patch = IndicatorPatch { name: Some("B".into()), ..Default::default() };
    let Mutation { outcome, .. } = ds.update("Ghost", patch);
    assert_eq!(outcome, Err(TableError::NotFound("Ghost".into())));
  }

  #[test]
  fn update_refuses_blank_rename() {
    let ds = Dataset::default().add(indicator("Revenue", 1.0, 2.0)).dataset;
    let patch = IndicatorPatch { name: Some(" nan ".into()), ..Default::default() };
    let Mutation { dataset, outcome } = ds.update("Revenue", patch);
    assert_eq!(outcome, Err(TableError::BlankName));
    assert!(dataset.contains("Revenue"));
  }

  // ── Delete / clear ────────────────────────────────────────────────────────

  #[test]
  fn delete_removes_every_matching_row() {
    let ds = Dataset::default()
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset
      .add(indicator("Churn", 1.0, 2.0))
      .dataset
      .add(indicator("Revenue", 3.0, 2.0))
      .dataset;
    let Mutation { dataset, outcome } = ds.delete("Revenue");
    assert_eq!(outcome, Ok(Change::Deleted { removed: 2 }));
    assert_eq!(dataset.names(), vec!["Churn"]);
  }

  #[test]
  fn delete_ghost_leaves_dataset_unchanged() {
    let ds = Dataset::default().add(indicator("Revenue", 1.0, 2.0)).dataset;
    let before = ds.rows().to_vec();
    let Mutation { dataset, outcome } = ds.delete("Ghost Indicator");
    assert_eq!(outcome, Err(TableError::NotFound("Ghost Indicator".into())));
    assert_eq!(dataset.rows(), before.as_slice());
  }

  #[test]
  fn clear_empties_but_keeps_policy() {
    let ds = Dataset::new(DuplicatePolicy::Reject)
      .add(indicator("Revenue", 1.0, 2.0))
      .dataset;
    let Mutation { dataset, outcome } = ds.clear();
    assert_eq!(outcome, Ok(Change::Cleared { removed: 1 }));
    assert!(dataset.is_empty());
    assert_eq!(dataset.policy(), DuplicatePolicy::Reject);
  }

  // ── Summary ───────────────────────────────────────────────────────────────

  #[test]
  fn summarize_empty_is_all_zero() {
    let s = Dataset::default().summarize();
    assert_eq!(s.total, 0);
    assert_eq!(s.green_count, 0);
    assert_eq!(s.red_count, 0);
    assert_eq!(s.na_count, 0);
    assert_eq!(s.green_ratio, 0.0);
  }

  #[test]
  fn summarize_counts_statuses_and_kinds() {
    let mut na = indicator("Audit", 0.0, 0.0);
    na.actual = Some("pending".into());
    na.kind = Some(IndicatorKind::Kci);

    let ds = Dataset::default()
      .add(indicator("Revenue", 13.5, 12.0))
      .dataset
      .add(indicator("Margin", 1.0, 12.0))
      .dataset
      .add(na)
      .dataset
      .add(indicator("Uptime", 99.9, 99.0))
      .dataset;

    let s = ds.summarize();
    assert_eq!(s.total, 4);
    assert_eq!(s.green_count, 2);
    assert_eq!(s.red_count, 1);
    assert_eq!(s.na_count, 1);
    assert_eq!(s.green_ratio, 0.5);
    assert_eq!(s.green_percent(), 50.0);
    assert_eq!(s.kinds, KindCounts { kpi: 3, kri: 0, kci: 1 });
    assert_eq!(ds.kinds_present(), vec![IndicatorKind::Kpi, IndicatorKind::Kci]);
  }

  // ── Storage shape ─────────────────────────────────────────────────────────

  #[test]
  fn raw_rows_survive_a_reload() {
    let mut range = IndicatorRecord::named("Temp");
    range.direction = Some(Direction::Range);
    range.actual = Some(95.0.into());
    range.target_min = Some(90.0.into());
    range.target_max = Some(100.0.into());
    range.observed_on = chrono::NaiveDate::from_ymd_opt(2024, 5, 17);
    range.notes = Some("weekly".into());

    let ds = Dataset::default().add(range.clone()).dataset;
    let raw = ds.to_raw_rows();
    assert_eq!(raw[0].status.as_deref(), Some("Green"));
    assert_eq!(raw[0].observed_on.as_deref(), Some("2024-05-17"));

    let reloaded = Dataset::load(raw);
    assert_eq!(reloaded.rows()[0].record(), &range);
    assert_eq!(reloaded.rows()[0].status(), Status::Green);
  }
}
