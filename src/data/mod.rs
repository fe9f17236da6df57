//! Data ingestion and storage
//!
//! CSV import, team name normalization, SQLite storage and the historical
//! feature table.

pub mod database;
pub mod dataset;
pub mod import;
pub mod teams;

pub use database::{Database, DatabaseStats};
pub use dataset::{FeatureRow, FeatureTable, FeatureTableBuilder};
pub use import::{import_csv, read_matches, ImportResult};
pub use teams::TeamNameNormalizer;
