//! Metric computation for the delivery analytics system.
//!
//! This crate handles:
//! - Summary metrics (average/max delivery %, distinct days and symbols)
//! - Spike detection against a delivery % threshold
//! - Aggregation by day, week, month, quarter, half-year and year
//! - Report assembly

pub mod aggregate;
pub mod report;
pub mod spikes;
pub mod summary;

pub use aggregate::{AggregateRow, Aggregator, PeriodTable};
pub use report::Report;
pub use spikes::{detect_spikes, Spike};
pub use summary::SummaryMetrics;
