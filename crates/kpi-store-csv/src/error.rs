//! Error type for `kpi-store-csv`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("csv error in {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("storage task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }

  pub(crate) fn csv(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> Self {
    let path = path.into();
    move |source| Self::Csv { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
