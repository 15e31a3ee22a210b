//! Full report assembly.

use crate::aggregate::{Aggregator, PeriodTable};
use crate::spikes::{detect_spikes, Spike};
use crate::summary::SummaryMetrics;
use chrono::NaiveDate;
use delivery_core::{Config, DateRange, Result};
use delivery_ingestion::Dataset;
use serde::Serialize;
use tracing::info;

/// Everything the dashboard shows for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Date range applied before computing.
    pub date_range: DateRange,
    /// First and last date actually present after filtering.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub summary: SummaryMetrics,
    pub spike_threshold_pct: f64,
    pub spikes: Vec<Spike>,
    pub net_value_threshold_crore: f64,
    pub tables: Vec<PeriodTable>,
}

impl Report {
    /// Build the report for `dataset` under `config`.
    pub fn build(dataset: &Dataset, config: &Config) -> Result<Self> {
        let range = config.report.date_range;
        let filtered = dataset.filter_range(&range);
        info!(
            total = dataset.len(),
            in_range = filtered.len(),
            "building report"
        );

        let summary = SummaryMetrics::compute(&filtered)?;
        let spikes = detect_spikes(&filtered, config.alerts.spike_threshold_pct);
        let aggregator = Aggregator::new(config.alerts.net_value_threshold_crore);
        let tables = aggregator.aggregate_all(&filtered, &config.report.periods);

        Ok(Self {
            date_range: range,
            date_bounds: filtered.date_bounds(),
            summary,
            spike_threshold_pct: config.alerts.spike_threshold_pct,
            spikes,
            net_value_threshold_crore: config.alerts.net_value_threshold_crore,
            tables,
        })
    }
}
