//! Query parameters shared by several endpoints.
//!
//! List-valued filters are accepted as comma-separated strings, e.g.
//! `?kind=KPI,KRI&unit=Mining`.

use chrono::NaiveDate;
use kpi_core::{filter::IndicatorFilter, record::IndicatorKind};
use serde::Deserialize;

use crate::error::ApiError;

/// `?year=` alone, for endpoints that take no filter.
#[derive(Debug, Default, Deserialize)]
pub struct YearParam {
  pub year: Option<i32>,
}

/// `?year=` plus the row filter.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
  pub year:     Option<i32>,
  /// Comma-separated kinds, e.g. `KPI,KCI`.
  pub kind:     Option<String>,
  /// Comma-separated unit names.
  pub unit:     Option<String>,
  /// Comma-separated categories.
  pub category: Option<String>,
  pub from:     Option<NaiveDate>,
  pub to:       Option<NaiveDate>,
}

impl FilterParams {
  pub fn filter(&self) -> Result<IndicatorFilter, ApiError> {
    let kinds = split(self.kind.as_deref())
      .into_iter()
      .map(|k| {
        k.parse::<IndicatorKind>()
          .map_err(|_| ApiError::BadRequest(format!("unknown indicator kind {k:?}")))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(IndicatorFilter {
      kinds,
      units: split(self.unit.as_deref()),
      categories: split(self.category.as_deref()),
      from: self.from,
      to: self.to,
    })
  }
}

fn split(list: Option<&str>) -> Vec<String> {
  list
    .map(|s| {
      s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn comma_lists_become_filter_sets() {
    let params = FilterParams {
      kind: Some("kpi, KRI".into()),
      unit: Some("Mining,,Refinery".into()),
      ..FilterParams::default()
    };
    let filter = params.filter().unwrap();
    assert_eq!(filter.kinds, vec![IndicatorKind::Kpi, IndicatorKind::Kri]);
    assert_eq!(filter.units, vec!["Mining".to_owned(), "Refinery".to_owned()]);
    assert!(filter.categories.is_empty());
  }

  #[test]
  fn unknown_kind_is_a_bad_request() {
    let params = FilterParams { kind: Some("KXI".into()), ..FilterParams::default() };
    assert!(matches!(params.filter(), Err(ApiError::BadRequest(_))));
  }
}
