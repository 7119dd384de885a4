//! Handlers for `/indicators` endpoints.
//!
//! | Method   | Path                 | Notes |
//! |----------|----------------------|-------|
//! | `GET`    | `/indicators`        | Filtered rows with their status |
//! | `POST`   | `/indicators`        | Body: [`IndicatorRecord`]; returns 201 |
//! | `PATCH`  | `/indicators/{name}` | Body: [`IndicatorPatch`]; first row with that name |
//! | `DELETE` | `/indicators/{name}` | Every row with that name |
//! | `DELETE` | `/indicators`        | Every row of the partition |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kpi_core::{
  record::{IndicatorPatch, IndicatorRecord, is_placeholder_name},
  store::IndicatorStore,
  table::{Change, EvaluatedIndicator, Summary},
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  params::{FilterParams, YearParam},
  state::{AppState, Locked, Reply},
};

/// Payload of every mutation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applied {
  pub change:  Change,
  /// Counters of the partition after the change.
  pub summary: Summary,
}

impl Applied {
  fn of(change: Change, locked: &Locked<'_>) -> Self {
    Self { change, summary: locked.dataset().summarize() }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /indicators[?year=...][&kind=...][&unit=...][&category=...][&from=...][&to=...]`
pub async fn list<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Reply<Vec<EvaluatedIndicator>>>, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  let rows = filter.apply(locked.dataset()).into_iter().cloned().collect();
  Ok(Json(Reply::new(rows, locked.warning)))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

/// `POST /indicators`: appends the record and returns 201.
///
/// Dated records go to the partition of their observation year; `?year=` only
/// places undated ones.
pub async fn add<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<YearParam>,
  Json(mut record): Json<IndicatorRecord>,
) -> Result<impl IntoResponse, ApiError> {
  record.name = record.name.trim().to_owned();
  record.validate()?;

  let session = state.session().await;
  let partition = match record.observed_on {
    Some(_) => session.scheme().partition_for(&record),
    None => session.scheme().resolve(params.year),
  };
  let mut locked = state.lock_partition(session, partition).await;
  let change = locked.session.add(partition, record)?;
  state.autosave(&mut locked).await;

  let applied = Applied::of(change, &locked);
  Ok((StatusCode::CREATED, Json(Reply::new(applied, locked.warning))))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /indicators/{name}`: patches the first row with that name.
///
/// The row stays in its partition even if the patch moves its date into
/// another year.
pub async fn update<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Query(params): Query<YearParam>,
  Json(mut patch): Json<IndicatorPatch>,
) -> Result<Json<Reply<Applied>>, ApiError> {
  if let Some(new_name) = patch.name.as_mut() {
    *new_name = new_name.trim().to_owned();
    if is_placeholder_name(new_name) {
      return Err(kpi_core::Error::BlankName.into());
    }
  }

  let mut locked = state.lock(params.year).await;
  let partition = locked.partition;
  let change = locked.session.update(partition, &name, patch)?;
  state.autosave(&mut locked).await;

  let applied = Applied::of(change, &locked);
  Ok(Json(Reply::new(applied, locked.warning)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /indicators/{name}`: removes every row with that name.
pub async fn delete<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Query(params): Query<YearParam>,
) -> Result<Json<Reply<Applied>>, ApiError> {
  let mut locked = state.lock(params.year).await;
  let partition = locked.partition;
  let change = locked.session.delete(partition, &name)?;
  state.autosave(&mut locked).await;

  let applied = Applied::of(change, &locked);
  Ok(Json(Reply::new(applied, locked.warning)))
}

/// `DELETE /indicators`: empties the partition.
pub async fn clear<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<YearParam>,
) -> Result<Json<Reply<Applied>>, ApiError> {
  let mut locked = state.lock(params.year).await;
  let partition = locked.partition;
  let change = locked.session.clear(partition)?;
  state.autosave(&mut locked).await;

  let applied = Applied::of(change, &locked);
  Ok(Json(Reply::new(applied, locked.warning)))
}
