//! Handlers for `/charts/*`: the series behind the dashboard charts.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kpi_core::{
  chart::{self, Heatmap, StatusCount, TrendPoint},
  store::IndicatorStore,
};

use crate::{
  error::ApiError,
  params::FilterParams,
  state::{AppState, Reply},
};

/// `GET /charts/status-by-kind`
pub async fn status_by_kind<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Reply<Vec<StatusCount>>>, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  let series = chart::status_by_kind(filter.apply(locked.dataset()));
  Ok(Json(Reply::new(series, locked.warning)))
}

/// `GET /charts/trend/{name}`. 404 when no filtered row has that name.
pub async fn trend<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Reply<Vec<TrendPoint>>>, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  let series = chart::trend(filter.apply(locked.dataset()), &name);
  if series.is_empty() {
    return Err(ApiError::NotFound(format!("indicator not found: {name:?}")));
  }
  Ok(Json(Reply::new(series, locked.warning)))
}

/// `GET /charts/heatmap`
pub async fn heatmap<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Reply<Heatmap>>, ApiError> {
  let filter = params.filter()?;
  let locked = state.lock(params.year).await;
  let map = chart::heatmap(filter.apply(locked.dataset()));
  Ok(Json(Reply::new(map, locked.warning)))
}
