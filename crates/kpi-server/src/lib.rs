//! HTTP server for the indicator dashboard.
//!
//! Wires a [`CsvStore`] into the JSON API and adds request tracing. The
//! binary in `main.rs` only reads configuration and serves [`app`].

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use kpi_api::ApiSettings;
use kpi_core::{store::PartitionScheme, table::DuplicatePolicy};
use kpi_store_csv::CsvStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `KPI_*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Directory holding the CSV files.
  pub data_dir:          PathBuf,
  /// File name without extension; yearly files get a `_<year>` suffix.
  pub file_stem:         String,
  /// Keep one file per observation year instead of a single table.
  pub partition_by_year: bool,
  pub duplicates:        DuplicatePolicy,
  /// Save after every successful change.
  pub autosave:          bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      data_dir:          PathBuf::from("data"),
      file_stem:         "kpi_kri_kci_data".to_string(),
      partition_by_year: false,
      duplicates:        DuplicatePolicy::Allow,
      autosave:          true,
    }
  }
}

impl ServerConfig {
  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      scheme:   if self.partition_by_year {
        PartitionScheme::Yearly
      } else {
        PartitionScheme::Single
      },
      policy:   self.duplicates,
      autosave: self.autosave,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn app(store: CsvStore, config: &ServerConfig) -> Router {
  Router::new()
    .nest("/api", kpi_api::api_router(Arc::new(store), config.api_settings()))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{Config, File, FileFormat};
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    assert_eq!(parse(""), ServerConfig::default());
  }

  #[test]
  fn config_overrides_selected_fields() {
    let config = parse(
      r#"
        port = 9000
        data_dir = "/srv/kpi"
        partition_by_year = true
        duplicates = "reject"
      "#,
    );
    assert_eq!(config.port, 9000);
    assert_eq!(config.data_dir, PathBuf::from("/srv/kpi"));
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.address(), "127.0.0.1:9000");

    let settings = config.api_settings();
    assert_eq!(settings.scheme, PartitionScheme::Yearly);
    assert_eq!(settings.policy, DuplicatePolicy::Reject);
    assert!(settings.autosave);
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig { data_dir: dir.path().to_path_buf(), ..ServerConfig::default() };
    let store = CsvStore::open(&config.data_dir, &config.file_stem).await.unwrap();
    let app = app(store, &config);

    let req = Request::builder().uri("/api/summary").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["total"], 0);

    let req = Request::builder().uri("/summary").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
