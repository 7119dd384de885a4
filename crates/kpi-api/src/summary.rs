//! Handler for `GET /summary`.

use axum::{
  Json,
  extract::{Query, State},
};
use kpi_core::{store::IndicatorStore, table::Summary};

use crate::{
  error::ApiError,
  params::FilterParams,
  state::{AppState, Reply},
};

/// `GET /summary[?year=...][&kind=...]...`: counters over the filtered rows.
pub async fn handler<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Reply<Summary>>, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  let summary = Summary::of(filter.apply(locked.dataset()));
  Ok(Json(Reply::new(summary, locked.warning)))
}
