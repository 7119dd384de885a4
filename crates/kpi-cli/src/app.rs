//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use kpi_core::{
  record::IndicatorKind,
  table::{Change, EvaluatedIndicator, Summary},
};

use crate::client::ApiClient;

// ─── Mode ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  /// Navigating the table.
  Normal,
  /// Typing a fuzzy search query.
  Search,
  /// Waiting for `y` to delete every row with this name.
  ConfirmDelete(String),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub mode: Mode,

  /// Rows of the current partition, already narrowed by `kind_filter`.
  pub rows: Vec<EvaluatedIndicator>,

  /// Counters for the same rows, as computed by the server.
  pub summary: Summary,

  /// Server-side kind filter, cycled with `t`.
  pub kind_filter: Option<IndicatorKind>,

  /// Fuzzy query over indicator names.
  pub search: String,

  /// Cursor position within the *searched* row list.
  pub cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  /// Create an [`App`] with an empty table.
  pub fn new(client: ApiClient) -> Self {
    Self {
      mode: Mode::Normal,
      rows: Vec::new(),
      summary: Summary::default(),
      kind_filter: None,
      search: String::new(),
      cursor: 0,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the rows and counters for the current kind filter.
  pub async fn refresh(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading indicators…".into();
    let fetched = async {
      let rows = self.client.list_indicators(self.kind_filter).await?;
      let summary = self.client.summary(self.kind_filter).await?;
      anyhow::Ok((rows, summary))
    }
    .await;

    match fetched {
      Ok((rows, summary)) => {
        self.rows = rows.data;
        self.summary = summary.data;
        self.clamp_cursor();
        self.status_msg = rows.warning.or(summary.warning).unwrap_or_default();
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "refresh failed");
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Run a command, then refresh. Errors end up in the status bar.
  async fn command(&mut self, result: anyhow::Result<(String, Option<String>)>) {
    match result {
      Ok((done, warning)) => {
        tracing::info!(%done, ?warning, "command finished");
        if self.refresh().await.is_ok() {
          self.status_msg = match warning {
            Some(w) => format!("{done} (warning: {w})"),
            None => done,
          };
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, "command failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  // ── Searched list ─────────────────────────────────────────────────────────

  /// Rows whose name matches the search query, in table order.
  pub fn visible_rows(&self) -> Vec<&EvaluatedIndicator> {
    if self.search.is_empty() {
      return self.rows.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .rows
      .iter()
      .filter(|row| matcher.fuzzy_match(row.name(), &self.search).is_some())
      .collect()
  }

  /// The row under the cursor, if any.
  pub fn cursor_row(&self) -> Option<&EvaluatedIndicator> {
    self.visible_rows().get(self.cursor).copied()
  }

  fn clamp_cursor(&mut self) {
    let len = self.visible_rows().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  /// Next kind in the `t` cycle: all, KPI, KRI, KCI, all, ...
  pub fn next_kind(kind: Option<IndicatorKind>) -> Option<IndicatorKind> {
    match kind {
      None => Some(IndicatorKind::Kpi),
      Some(IndicatorKind::Kpi) => Some(IndicatorKind::Kri),
      Some(IndicatorKind::Kri) => Some(IndicatorKind::Kci),
      Some(IndicatorKind::Kci) => None,
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    match self.mode.clone() {
      Mode::Search => self.handle_search_key(key),
      Mode::ConfirmDelete(name) => self.handle_confirm_key(key, name).await,
      Mode::Normal => self.handle_normal_key(key).await,
    }
  }

  fn handle_search_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search.clear();
        self.cursor = 0;
      }
      KeyCode::Enter => {
        self.mode = Mode::Normal;
        self.cursor = 0;
      }
      KeyCode::Backspace => {
        self.search.pop();
        self.cursor = 0;
      }
      KeyCode::Char(c) => {
        self.search.push(c);
        self.cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent, name: String) -> anyhow::Result<bool> {
    self.mode = Mode::Normal;
    if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
      self.status_msg = "Delete cancelled".into();
      return Ok(true);
    }

    let result = self.client.delete(&name).await.map(|reply| {
      let removed = match reply.data.change {
        Change::Deleted { removed } => removed,
        _ => 0,
      };
      let done = format!("Deleted {removed} row(s) named {name:?}");
      (done, reply.warning)
    });
    self.command(result).await;
    Ok(true)
  }

  async fn handle_normal_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.visible_rows().len();
        if len > 0 && self.cursor + 1 < len {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }

      // Search
      KeyCode::Char('/') => {
        self.mode = Mode::Search;
        self.search.clear();
        self.cursor = 0;
      }

      // Kind filter
      KeyCode::Char('t') => {
        self.kind_filter = Self::next_kind(self.kind_filter);
        self.cursor = 0;
        // A failed refresh is already reported in the status bar.
        let _ = self.refresh().await;
      }

      // Delete, after confirmation
      KeyCode::Char('d') => {
        if let Some(name) = self.cursor_row().map(|r| r.name().to_owned()) {
          self.status_msg = format!("Delete every row named {name:?}? [y/N]");
          self.mode = Mode::ConfirmDelete(name);
        }
      }

      // Storage
      KeyCode::Char('r') => {
        let result = self
          .client
          .reload()
          .await
          .map(|r| (format!("Reloaded {} row(s)", r.data.rows), r.warning));
        self.command(result).await;
      }
      KeyCode::Char('s') => {
        let result = self
          .client
          .save()
          .await
          .map(|r| (format!("Saved {} row(s)", r.data.rows), r.warning));
        self.command(result).await;
      }
      KeyCode::Char('g') => {
        let _ = self.refresh().await;
      }

      _ => {}
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use kpi_core::{record::IndicatorRecord, table::Dataset};

  use super::*;
  use crate::client::ApiConfig;

  fn app_with(names: &[&str]) -> App {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      year:     None,
    })
    .unwrap();
    let mut app = App::new(client);
    let dataset = names
      .iter()
      .fold(Dataset::default(), |ds, name| ds.add(IndicatorRecord::named(*name)).dataset);
    app.rows = dataset.rows().to_vec();
    app
  }

  fn press(code: KeyCode) -> KeyEvent { KeyEvent::from(code) }

  #[test]
  fn kind_cycle_wraps_to_all() {
    let mut kind = None;
    let mut seen = Vec::new();
    for _ in 0..4 {
      kind = App::next_kind(kind);
      seen.push(kind);
    }
    assert_eq!(seen, vec![
      Some(IndicatorKind::Kpi),
      Some(IndicatorKind::Kri),
      Some(IndicatorKind::Kci),
      None,
    ]);
  }

  #[tokio::test]
  async fn search_narrows_by_fuzzy_name() {
    let mut app = app_with(&["Revenue", "Lost time injuries", "Audit findings"]);
    app.handle_key(press(KeyCode::Char('/'))).await.unwrap();
    for c in "rev".chars() {
      app.handle_key(press(KeyCode::Char(c))).await.unwrap();
    }
    assert_eq!(app.mode, Mode::Search);
    let names: Vec<_> = app.visible_rows().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["Revenue"]);

    app.handle_key(press(KeyCode::Esc)).await.unwrap();
    assert_eq!(app.visible_rows().len(), 3);
  }

  #[tokio::test]
  async fn cursor_stays_in_bounds() {
    let mut app = app_with(&["A", "B"]);
    for _ in 0..5 {
      app.handle_key(press(KeyCode::Down)).await.unwrap();
    }
    assert_eq!(app.cursor_row().unwrap().name(), "B");
    for _ in 0..5 {
      app.handle_key(press(KeyCode::Up)).await.unwrap();
    }
    assert_eq!(app.cursor, 0);
  }

  #[tokio::test]
  async fn delete_needs_confirmation() {
    let mut app = app_with(&["Revenue"]);
    app.handle_key(press(KeyCode::Char('d'))).await.unwrap();
    assert_eq!(app.mode, Mode::ConfirmDelete("Revenue".into()));

    app.handle_key(press(KeyCode::Char('n'))).await.unwrap();
    assert_eq!(app.mode, Mode::Normal);
    assert_eq!(app.status_msg, "Delete cancelled");
    assert_eq!(app.rows.len(), 1);
  }

  #[tokio::test]
  async fn quit_keys() {
    let mut app = app_with(&[]);
    assert!(!app.handle_key(press(KeyCode::Char('q'))).await.unwrap());
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(!app.handle_key(ctrl_c).await.unwrap());
  }
}
