//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kpi_core::table::TableError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The store could not be read or written. The in-memory dataset is left
  /// as it was, so the request can be retried.
  #[error("storage unavailable: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("export failed: {0}")]
  Export(#[from] rust_xlsxwriter::XlsxError),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl From<TableError> for ApiError {
  fn from(e: TableError) -> Self {
    match e {
      TableError::NotFound(_) => Self::NotFound(e.to_string()),
      TableError::DuplicateName(_) => Self::Conflict(e.to_string()),
      TableError::BlankName => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<kpi_core::Error> for ApiError {
  fn from(e: kpi_core::Error) -> Self {
    match e {
      kpi_core::Error::BlankName => Self::BadRequest(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
