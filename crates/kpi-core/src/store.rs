//! The `IndicatorStore` trait and partition keys.
//!
//! The trait is implemented by storage backends (e.g. `kpi-store-csv`).
//! Higher layers (`kpi-api`, `kpi-server`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{Datelike as _, Local};
use serde::{Deserialize, Serialize};

use crate::record::{IndicatorRecord, RawRow};

// ─── Partitions ──────────────────────────────────────────────────────────────

/// Which slice of the indicator history a dataset holds.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "partition", content = "year", rename_all = "snake_case")]
pub enum Partition {
  /// Everything in one table.
  All,
  /// Records observed in one calendar year.
  Year(i32),
}

impl std::fmt::Display for Partition {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Year(year) => write!(f, "{year}"),
    }
  }
}

/// How records are split across partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionScheme {
  /// One table for every year.
  #[default]
  Single,
  /// One table per year of `observed_on`.
  Yearly,
}

impl PartitionScheme {
  /// The partition a request for `year` addresses. Without a year, yearly
  /// mode falls back to the current year.
  pub fn resolve(self, year: Option<i32>) -> Partition {
    match self {
      Self::Single => Partition::All,
      Self::Yearly => Partition::Year(year.unwrap_or_else(current_year)),
    }
  }

  /// The partition `record` belongs to. Undated records land in the current
  /// year.
  pub fn partition_for(self, record: &IndicatorRecord) -> Partition {
    self.resolve(record.observed_on.map(|d| d.year()))
  }
}

fn current_year() -> i32 { Local::now().year() }

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over where indicator tables are kept.
///
/// Saves overwrite the whole partition; there is no partial-write recovery and
/// no coordination between independent writers. The last save wins.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IndicatorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every stored row of `partition`. A partition that was never saved yields
  /// an empty list, not an error.
  fn load_all(
    &self,
    partition: Partition,
  ) -> impl Future<Output = Result<Vec<RawRow>, Self::Error>> + Send + '_;

  /// Replace the stored contents of `partition` with `rows`.
  fn save_all(
    &self,
    partition: Partition,
    rows: Vec<RawRow>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Partitions that currently have stored data, sorted.
  fn partitions(
    &self,
  ) -> impl Future<Output = Result<Vec<Partition>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  #[test]
  fn single_scheme_ignores_years() {
    assert_eq!(PartitionScheme::Single.resolve(Some(2021)), Partition::All);
    let mut r = IndicatorRecord::named("x");
    r.observed_on = NaiveDate::from_ymd_opt(2021, 6, 1);
    assert_eq!(PartitionScheme::Single.partition_for(&r), Partition::All);
  }

  #[test]
  fn yearly_scheme_uses_observation_year() {
    let mut r = IndicatorRecord::named("x");
    r.observed_on = NaiveDate::from_ymd_opt(2021, 6, 1);
    assert_eq!(PartitionScheme::Yearly.partition_for(&r), Partition::Year(2021));
    assert_eq!(PartitionScheme::Yearly.resolve(Some(1999)), Partition::Year(1999));
  }

  #[test]
  fn yearly_scheme_defaults_to_current_year() {
    let year = Local::now().year();
    assert_eq!(PartitionScheme::Yearly.resolve(None), Partition::Year(year));
    let undated = IndicatorRecord::named("x");
    assert_eq!(PartitionScheme::Yearly.partition_for(&undated), Partition::Year(year));
  }
}
