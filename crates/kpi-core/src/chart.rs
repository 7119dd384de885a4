//! Series for the dashboard charts.
//!
//! Plain aggregations over a (usually filtered) set of rows; rendering is the
//! presentation layer's job.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  record::{IndicatorKind, Measure},
  status::Status,
  table::EvaluatedIndicator,
};

// ─── Status by kind ──────────────────────────────────────────────────────────

/// One bar segment: how many rows of `kind` have `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
  pub kind:   Option<IndicatorKind>,
  pub status: Status,
  pub count:  usize,
}

/// Counts per (kind, status), ordered by kind then status. Rows without a kind
/// sort last. Combinations with no rows are omitted.
pub fn status_by_kind<'a>(
  rows: impl IntoIterator<Item = &'a EvaluatedIndicator>,
) -> Vec<StatusCount> {
  let mut counts: BTreeMap<(KindKey, Status), usize> = BTreeMap::new();
  for row in rows {
    *counts
      .entry((KindKey(row.record().kind), row.status()))
      .or_default() += 1;
  }
  counts
    .into_iter()
    .map(|((KindKey(kind), status), count)| StatusCount { kind, status, count })
    .collect()
}

/// Orders `None` after every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KindKey(Option<IndicatorKind>);

impl Ord for KindKey {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    match (self.0, other.0) {
      (Some(a), Some(b)) => a.cmp(&b),
      (Some(_), None) => std::cmp::Ordering::Less,
      (None, Some(_)) => std::cmp::Ordering::Greater,
      (None, None) => std::cmp::Ordering::Equal,
    }
  }
}

impl PartialOrd for KindKey {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

// ─── Trend ───────────────────────────────────────────────────────────────────

/// One observation of an indicator over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub observed_on: Option<NaiveDate>,
  pub target:      Option<f64>,
  pub actual:      Option<f64>,
  pub status:      Status,
}

/// Target and actual over time for every row named `name`, oldest first.
/// Undated rows keep their table order after the dated ones.
pub fn trend<'a>(
  rows: impl IntoIterator<Item = &'a EvaluatedIndicator>,
  name: &str,
) -> Vec<TrendPoint> {
  let mut points: Vec<TrendPoint> = rows
    .into_iter()
    .filter(|row| row.name() == name)
    .map(|row| {
      let record = row.record();
      TrendPoint {
        observed_on: record.observed_on,
        target:      record.target.as_ref().and_then(Measure::as_number),
        actual:      record.actual.as_ref().and_then(Measure::as_number),
        status:      row.status(),
      }
    })
    .collect();
  points.sort_by_key(|p| (p.observed_on.is_none(), p.observed_on));
  points
}

// ─── Heatmap ─────────────────────────────────────────────────────────────────

/// Mean status score per unit (rows) and category (columns).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
  pub units:      Vec<String>,
  pub categories: Vec<String>,
  /// `cells[u][c]` is the mean [`Status::score`] for `units[u]` and
  /// `categories[c]`, or `None` when no row has that pair.
  pub cells:      Vec<Vec<Option<f64>>>,
}

impl Heatmap {
  pub fn get(&self, unit: &str, category: &str) -> Option<f64> {
    let u = self.units.iter().position(|x| x == unit)?;
    let c = self.categories.iter().position(|x| x == category)?;
    self.cells[u][c]
  }
}

pub fn heatmap<'a>(rows: impl IntoIterator<Item = &'a EvaluatedIndicator>) -> Heatmap {
  let mut sums: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
  for row in rows {
    let record = row.record();
    let entry = sums
      .entry((record.unit_name.as_str(), record.category.as_str()))
      .or_default();
    entry.0 += row.status().score();
    entry.1 += 1;
  }

  let mut units: Vec<String> = sums.keys().map(|(u, _)| (*u).to_owned()).collect();
  units.dedup();
  let mut categories: Vec<String> = sums.keys().map(|(_, c)| (*c).to_owned()).collect();
  categories.sort();
  categories.dedup();

  let cells = units
    .iter()
    .map(|unit| {
      categories
        .iter()
        .map(|category| {
          sums
            .get(&(unit.as_str(), category.as_str()))
            .map(|(sum, n)| sum / *n as f64)
        })
        .collect()
    })
    .collect();

  Heatmap { units, categories, cells }
}
