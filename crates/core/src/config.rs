//! Configuration structures for the delivery analytics system.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{DateRange, Period};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV ingestion configuration.
    pub ingest: IngestConfig,
    /// Alert thresholds.
    pub alerts: AlertConfig,
    /// Report layout.
    pub report: ReportConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.ingest.validate()?;
        self.alerts.validate()?;
        self.report.validate()
    }
}

/// CSV ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Cell values treated as missing.
    pub missing_markers: Vec<String>,
    /// chrono formats tried in order when parsing the date column.
    pub date_formats: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            missing_markers: ["-", "NA", "N/A", "na", ""]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            date_formats: [
                "%Y-%m-%d", "%d-%b-%Y", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%d %b %Y",
                "%b %d, %Y", "%d-%B-%Y",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl IngestConfig {
    fn validate(&self) -> Result<()> {
        if self.date_formats.is_empty() {
            return Err(Error::config("ingest.date_formats must not be empty"));
        }
        Ok(())
    }
}

/// Alert thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Rows at or above this delivery % are reported as spikes.
    pub spike_threshold_pct: f64,
    /// Aggregated net values above this (in crores) are flagged.
    pub net_value_threshold_crore: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            spike_threshold_pct: 75.0,
            net_value_threshold_crore: 3.0,
        }
    }
}

impl AlertConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.spike_threshold_pct) {
            return Err(Error::config(format!(
                "alerts.spike_threshold_pct must be within 0-100, got {}",
                self.spike_threshold_pct
            )));
        }
        if !(0.0..=50.0).contains(&self.net_value_threshold_crore) {
            return Err(Error::config(format!(
                "alerts.net_value_threshold_crore must be within 0-50, got {}",
                self.net_value_threshold_crore
            )));
        }
        Ok(())
    }
}

/// Report layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Aggregation tables to produce, in order.
    pub periods: Vec<Period>,
    /// Dates considered by the report.
    pub date_range: DateRange,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            periods: Period::ALL.to_vec(),
            date_range: DateRange::default(),
        }
    }
}

impl ReportConfig {
    fn validate(&self) -> Result<()> {
        if self.periods.is_empty() {
            return Err(Error::config("report.periods must not be empty"));
        }
        self.date_range.validate()
    }
}
