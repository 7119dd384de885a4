//! Row filters for charts, export and list views.
//!
//! A filter is a conjunction of optional predicates. An empty list means "any
//! value" for that field; a date bound excludes rows without a date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{record::IndicatorKind, table::EvaluatedIndicator};

/// Predicate over evaluated rows. The default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFilter {
  #[serde(default)]
  pub kinds:      Vec<IndicatorKind>,
  #[serde(default)]
  pub units:      Vec<String>,
  #[serde(default)]
  pub categories: Vec<String>,
  /// Inclusive lower bound on `observed_on`.
  pub from:       Option<NaiveDate>,
  /// Inclusive upper bound on `observed_on`.
  pub to:         Option<NaiveDate>,
}

impl IndicatorFilter {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  pub fn matches(&self, row: &EvaluatedIndicator) -> bool {
    let record = row.record();

    if !self.kinds.is_empty()
      && !record.kind.is_some_and(|k| self.kinds.contains(&k))
    {
      return false;
    }
    if !self.units.is_empty() && !self.units.contains(&record.unit_name) {
      return false;
    }
    if !self.categories.is_empty() && !self.categories.contains(&record.category) {
      return false;
    }
    if self.from.is_some() || self.to.is_some() {
      let Some(date) = record.observed_on else {
        return false;
      };
      if self.from.is_some_and(|from| date < from) {
        return false;
      }
      if self.to.is_some_and(|to| date > to) {
        return false;
      }
    }
    true
  }

  /// The matching rows, in table order.
  pub fn apply<'a>(
    &self,
    rows: impl IntoIterator<Item = &'a EvaluatedIndicator>,
  ) -> Vec<&'a EvaluatedIndicator> {
    rows.into_iter().filter(|row| self.matches(row)).collect()
  }
}
