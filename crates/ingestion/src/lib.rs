//! Data ingestion and normalization for the delivery analytics system.
//!
//! This crate handles:
//! - Header normalization and column aliasing
//! - Cell cleaning (missing markers, thousands separators, percent signs)
//! - CSV loading with row-level issue reporting
//! - Merging multiple files into one de-duplicated dataset

pub mod clean;
pub mod columns;
pub mod loader;
pub mod merge;

pub use columns::{Column, ColumnMap};
pub use loader::{CsvLoader, LoadedFile, RowIssue};
pub use merge::{merge, Dataset};
