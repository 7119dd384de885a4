//! Shared handler state: the store, the session and the response envelope.

use std::sync::Arc;

use kpi_core::{
  session::Session,
  store::{IndicatorStore, Partition, PartitionScheme},
  table::{Dataset, DuplicatePolicy},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ApiError;

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Behaviour switches for the API, usually taken from the server config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
  pub scheme:   PartitionScheme,
  pub policy:   DuplicatePolicy,
  /// Save the partition after every successful mutation.
  pub autosave: bool,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      scheme:   PartitionScheme::default(),
      policy:   DuplicatePolicy::default(),
      autosave: true,
    }
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  session:   Arc<Mutex<Session>>,
  autosave:  bool,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      session:  Arc::clone(&self.session),
      autosave: self.autosave,
    }
  }
}

/// The session, locked, with the requested partition loaded.
pub(crate) struct Locked<'a> {
  pub session:   MutexGuard<'a, Session>,
  pub partition: Partition,
  /// Set when the partition could not be loaded and started out empty.
  pub warning:   Option<String>,
}

impl Locked<'_> {
  pub fn dataset(&self) -> &Dataset {
    // `AppState::lock` always leaves the partition installed.
    static EMPTY: Dataset = Dataset::EMPTY;
    self.session.dataset(self.partition).unwrap_or(&EMPTY)
  }
}

impl<S: IndicatorStore> AppState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self {
      store,
      session: Arc::new(Mutex::new(Session::new(settings.scheme, settings.policy))),
      autosave: settings.autosave,
    }
  }

  /// Lock the session and make sure the partition for `year` is in memory.
  ///
  /// A partition is read from the store the first time it is asked for. If
  /// that read fails the partition starts empty, and every request for it
  /// carries a warning until a reload succeeds or it is saved explicitly.
  pub(crate) async fn lock(&self, year: Option<i32>) -> Locked<'_> {
    let session = self.session.lock().await;
    let partition = session.scheme().resolve(year);
    self.lock_partition(session, partition).await
  }

  /// Like [`AppState::lock`] for a guard the caller already holds.
  pub(crate) async fn lock_partition<'a>(
    &'a self,
    mut session: MutexGuard<'a, Session>,
    partition: Partition,
  ) -> Locked<'a> {
    if !session.is_loaded(partition) {
      match self.store.load_all(partition).await {
        Ok(rows) => {
          session.install(partition, Dataset::load(rows));
        }
        Err(e) => {
          tracing::warn!(%partition, error = %e, "load failed; starting with an empty table");
          session.install_unreadable(partition, e.to_string());
        }
      }
    }
    let warning = session
      .load_failure(partition)
      .map(|reason| format!("could not load partition {partition}: {reason}"));
    Locked { session, partition, warning }
  }

  pub(crate) async fn session(&self) -> MutexGuard<'_, Session> {
    self.session.lock().await
  }

  /// Write the in-memory copy of the locked partition to the store.
  ///
  /// This overwrites a stored copy that could not be read, and clears that
  /// partition's load failure along with its warning.
  pub(crate) async fn save(&self, locked: &mut Locked<'_>) -> Result<usize, ApiError> {
    let rows = locked.dataset().to_raw_rows();
    let count = rows.len();
    self
      .store
      .save_all(locked.partition, rows)
      .await
      .map_err(ApiError::store)?;
    locked.session.mark_saved(locked.partition);
    locked.warning = None;
    Ok(count)
  }

  /// Save after a mutation if autosave is on. A failed save keeps the change
  /// in memory and turns into a warning.
  ///
  /// A partition that could not be loaded is never autosaved: its stored rows
  /// are not in memory and would be lost.
  pub(crate) async fn autosave(&self, locked: &mut Locked<'_>) {
    if !self.autosave {
      return;
    }
    let message = if locked.session.load_failure(locked.partition).is_some() {
      tracing::warn!(partition = %locked.partition, "autosave skipped for unreadable partition");
      "change kept in memory but not saved: reload the partition, or save to overwrite the stored copy"
        .to_owned()
    } else {
      match self.save(locked).await {
        Ok(_) => return,
        Err(e) => format!("change kept in memory but not saved: {e}"),
      }
    };
    locked.warning = Some(match locked.warning.take() {
      Some(earlier) => format!("{earlier}; {message}"),
      None => message,
    });
  }
}

// ─── Envelope ─────────────────────────────────────────────────────────────────

/// Body of every JSON response: the payload plus an optional warning about
/// storage trouble that did not stop the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply<T> {
  pub data:    T,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
}

impl<T> Reply<T> {
  pub fn new(data: T, warning: Option<String>) -> Self { Self { data, warning } }
}
