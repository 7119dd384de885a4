//! Handlers that move a partition between memory and the store.
//!
//! | Method | Path          | Notes |
//! |--------|---------------|-------|
//! | `POST` | `/reload`     | Replace the in-memory copy with the stored one |
//! | `POST` | `/save`       | Write the in-memory copy; 503 on failure |
//! | `GET`  | `/partitions` | Stored and loaded partitions |

use axum::{
  Json,
  extract::{Query, State},
};
use kpi_core::{
  store::{IndicatorStore, Partition},
  table::{Dataset, Summary},
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  params::YearParam,
  state::{AppState, Reply},
};

/// What a reload or save touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synced {
  pub partition: Partition,
  pub rows:      usize,
  pub summary:   Summary,
}

/// `POST /reload[?year=...]`
///
/// Unsaved changes to the partition are discarded. When the store cannot be
/// read the request fails with 503 and the in-memory copy is kept.
pub async fn reload<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<YearParam>,
) -> Result<Json<Reply<Synced>>, ApiError> {
  let mut session = state.session().await;
  let partition = session.scheme().resolve(params.year);
  let rows = state.store.load_all(partition).await.map_err(ApiError::store)?;
  let dataset = session.install(partition, Dataset::load(rows));

  let synced = Synced {
    partition,
    rows: dataset.len(),
    summary: dataset.summarize(),
  };
  tracing::info!(%partition, rows = synced.rows, "partition reloaded");
  Ok(Json(Reply::new(synced, None)))
}

/// `POST /save[?year=...]`
///
/// Also the way to keep working on a partition that could not be loaded: the
/// stored copy is overwritten and autosave resumes.
pub async fn save<S: IndicatorStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<YearParam>,
) -> Result<Json<Reply<Synced>>, ApiError> {
  let mut locked = state.lock(params.year).await;
  let rows = state.save(&mut locked).await?;

  let synced = Synced {
    partition: locked.partition,
    rows,
    summary: locked.dataset().summarize(),
  };
  Ok(Json(Reply::new(synced, locked.warning)))
}

/// Partitions known to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitions {
  /// Partitions with a stored file.
  pub stored: Vec<Partition>,
  /// Partitions currently held in memory, saved or not.
  pub loaded: Vec<Partition>,
}

/// `GET /partitions`
pub async fn partitions<S: IndicatorStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Reply<Partitions>>, ApiError> {
  let stored = state.store.partitions().await.map_err(ApiError::store)?;
  let loaded = state.session().await.loaded();
  Ok(Json(Reply::new(Partitions { stored, loaded }, None)))
}
