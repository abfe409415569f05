//! Data ingestion and storage
//!
//! Cached standings parsing, per-driver histories and SQLite storage.

pub mod database;
pub mod ergast;
pub mod history;

pub use database::{Database, DatabaseStats};
pub use history::DriverHistory;
