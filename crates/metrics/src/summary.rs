//! Headline metrics over a dataset.

use chrono::NaiveDate;
use delivery_core::{Error, Result};
use delivery_ingestion::Dataset;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashSet;

/// Headline numbers for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    /// Mean of the per-row delivery percentage.
    pub avg_delivery_pct: f64,
    /// Largest per-row delivery percentage.
    pub max_delivery_pct: f64,
    /// Distinct trading dates.
    pub total_days: usize,
    /// Distinct symbols.
    pub total_symbols: usize,
}

impl SummaryMetrics {
    /// Compute summary metrics. Fails on an empty dataset.
    pub fn compute(dataset: &Dataset) -> Result<Self> {
        if dataset.is_empty() {
            return Err(Error::no_data("no records to summarize"));
        }

        let pcts: Vec<f64> = dataset.records().iter().map(|r| r.delivery_pct).collect();
        let days: HashSet<NaiveDate> = dataset.records().iter().map(|r| r.date).collect();
        let symbols: HashSet<&str> = dataset.records().iter().map(|r| r.symbol.as_str()).collect();

        Ok(Self {
            avg_delivery_pct: Statistics::mean(pcts.iter()),
            max_delivery_pct: Statistics::max(pcts.iter()),
            total_days: days.len(),
            total_symbols: symbols.len(),
        })
    }
}
