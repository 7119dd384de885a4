//! CSV file backend for the indicator store.
//!
//! One file per partition inside a data directory: `<stem>.csv` for the
//! single-table layout, `<stem>_<year>.csv` for yearly partitions. File I/O
//! runs on tokio's blocking pool so it never stalls the async runtime.

mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::CsvStore;

#[cfg(test)]
mod tests;
