//! Error types for `kpi-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("indicator name must not be blank")]
  BlankName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
