//! JSON REST API for the indicator dashboard.
//!
//! Exposes an axum [`Router`] backed by any
//! [`kpi_core::store::IndicatorStore`]. Every request runs one command against
//! the in-memory session and answers with a [`Reply`] envelope. Transport and
//! logging layers are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kpi_api::api_router(store.clone(), ApiSettings::default()))
//! ```

pub mod charts;
pub mod error;
pub mod export;
pub mod indicators;
pub mod params;
pub mod state;
pub mod summary;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use kpi_core::store::IndicatorStore;

pub use error::ApiError;
pub use state::{ApiSettings, AppState, Reply};

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ApiSettings) -> Router<()>
where
  S: IndicatorStore + 'static,
{
  router(AppState::new(store, settings))
}

/// Like [`api_router`] for an existing state, e.g. one shared with other
/// routers.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: IndicatorStore + 'static,
{
  Router::new()
    // Indicators
    .route(
      "/indicators",
      get(indicators::list::<S>)
        .post(indicators::add::<S>)
        .delete(indicators::clear::<S>),
    )
    .route(
      "/indicators/{name}",
      patch(indicators::update::<S>).delete(indicators::delete::<S>),
    )
    .route("/summary", get(summary::handler::<S>))
    // Storage
    .route("/reload", post(sync::reload::<S>))
    .route("/save", post(sync::save::<S>))
    .route("/partitions", get(sync::partitions::<S>))
    // Charts
    .route("/charts/status-by-kind", get(charts::status_by_kind::<S>))
    .route("/charts/trend/{name}", get(charts::trend::<S>))
    .route("/charts/heatmap", get(charts::heatmap::<S>))
    // Export
    .route("/export.xlsx", get(export::handler::<S>))
    .with_state(state)
}
