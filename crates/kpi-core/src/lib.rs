//! Core types and logic for the KPI / KRI / KCI indicator dashboard.
//!
//! This crate is deliberately free of HTTP and storage dependencies. It holds
//! the status rule, the indicator table and its mutations, and the aggregates
//! the dashboard shows. All other crates depend on it.

pub mod chart;
pub mod error;
pub mod filter;
pub mod record;
pub mod session;
pub mod status;
pub mod store;
pub mod table;

pub use error::{Error, Result};
pub use status::{Status, evaluate};
