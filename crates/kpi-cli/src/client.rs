//! Async HTTP client wrapping the dashboard JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use kpi_core::{
  record::IndicatorKind,
  table::{Change, EvaluatedIndicator, Summary},
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};

/// Connection settings for the dashboard API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Partition year sent with every request; the server ignores it in
  /// single-table mode.
  pub year:     Option<i32>,
}

/// Response body of every endpoint.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
  pub data:    T,
  #[serde(default)]
  pub warning: Option<String>,
}

/// Payload returned by mutations.
#[derive(Debug, Deserialize)]
pub struct Applied {
  pub change:  Change,
  pub summary: Summary,
}

/// Payload returned by reload and save.
#[derive(Debug, Deserialize)]
pub struct Synced {
  pub rows:    usize,
  pub summary: Summary,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the dashboard REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn year(&self) -> Option<i32> { self.config.year }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn with_year(&self, req: RequestBuilder) -> RequestBuilder {
    match self.config.year {
      Some(year) => req.query(&[("year", year)]),
      None => req,
    }
  }

  /// Send `req` and decode the envelope, turning `{"error": ...}` bodies into
  /// errors.
  async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<Reply<T>> {
    let resp = self
      .with_year(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    decode(resp, what).await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// `GET /api/indicators[?kind=...]`
  pub async fn list_indicators(
    &self,
    kind: Option<IndicatorKind>,
  ) -> Result<Reply<Vec<EvaluatedIndicator>>> {
    let mut req = self.client.get(self.url("/indicators"));
    if let Some(kind) = kind {
      req = req.query(&[("kind", kind.to_string())]);
    }
    self.send(req, "GET /indicators").await
  }

  /// `GET /api/summary[?kind=...]`
  pub async fn summary(&self, kind: Option<IndicatorKind>) -> Result<Reply<Summary>> {
    let mut req = self.client.get(self.url("/summary"));
    if let Some(kind) = kind {
      req = req.query(&[("kind", kind.to_string())]);
    }
    self.send(req, "GET /summary").await
  }

  // ── Commands ──────────────────────────────────────────────────────────────

  /// `DELETE /api/indicators/{name}`
  pub async fn delete(&self, name: &str) -> Result<Reply<Applied>> {
    let mut url = reqwest::Url::parse(&self.url("/indicators")).context("invalid base URL")?;
    url
      .path_segments_mut()
      .map_err(|()| anyhow!("base URL cannot have a path"))?
      .push(name);
    self.send(self.client.delete(url), "DELETE /indicators").await
  }

  /// `POST /api/reload`
  pub async fn reload(&self) -> Result<Reply<Synced>> {
    self.send(self.client.post(self.url("/reload")), "POST /reload").await
  }

  /// `POST /api/save`
  pub async fn save(&self) -> Result<Reply<Synced>> {
    self.send(self.client.post(self.url("/save")), "POST /save").await
  }
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<Reply<T>> {
  let status = resp.status();
  if status.is_success() {
    return resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"));
  }
  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => String::from("no details"),
  };
  Err(anyhow!("{what} → {status}: {message}"))
}
