//! CSV loading into cleaned delivery records.
//!
//! Rows that cannot be used (unparseable date, missing quantities or delivery
//! percentage, blank symbol) are skipped and reported as [`RowIssue`]s; only a
//! missing required column fails the whole file.

use crate::clean::{is_missing, parse_date, parse_number, parse_quantity};
use crate::columns::{Column, ColumnMap};
use csv::StringRecord;
use delivery_core::{config::IngestConfig, DeliveryRecord, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Allowed gap (percentage points) between reported and recomputed delivery %.
const PCT_TOLERANCE: f64 = 0.5;

/// A row skipped during loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    /// 1-based line number in the source file.
    pub line: usize,
    /// Why the row was skipped.
    pub reason: String,
}

/// Result of loading a single CSV source.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedFile {
    /// Source name (file path or label).
    pub source: String,
    /// Cleaned records, in file order.
    pub records: Vec<DeliveryRecord>,
    /// Data rows read, excluding the header.
    pub rows_read: usize,
    /// Rows that were skipped.
    pub row_issues: Vec<RowIssue>,
}

impl LoadedFile {
    /// Number of rows skipped.
    pub fn dropped_rows(&self) -> usize {
        self.row_issues.len()
    }
}

/// Loader for delivery CSV exports.
pub struct CsvLoader {
    missing_markers: Vec<String>,
    date_formats: Vec<String>,
}

impl CsvLoader {
    /// Create a new loader from ingestion settings.
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            missing_markers: config.missing_markers.clone(),
            date_formats: config.date_formats.clone(),
        }
    }

    /// Load a CSV file from disk.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadedFile> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        self.load_bytes(&path.display().to_string(), &bytes)
    }

    /// Load raw bytes, dropping invalid UTF-8 sequences.
    pub fn load_bytes(&self, source: &str, bytes: &[u8]) -> Result<LoadedFile> {
        let text: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
        self.load_str(source, &text)
    }

    /// Load CSV text.
    pub fn load_str(&self, source: &str, text: &str) -> Result<LoadedFile> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = ColumnMap::from_headers(&headers)
            .inspect_err(|e| warn!(source, error = %e, "input file rejected"))?;

        let mut records = Vec::new();
        let mut row_issues = Vec::new();
        let mut rows_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            rows_read += 1;
            let fallback_line = idx + 2;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    row_issues.push(RowIssue {
                        line: fallback_line,
                        reason: format!("CSV parse error: {e}"),
                    });
                    continue;
                }
            };
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line);

            match self.parse_row(&record, &columns) {
                Ok(rec) => {
                    if let Some(computed) = rec.computed_delivery_pct() {
                        if (computed - rec.delivery_pct).abs() > PCT_TOLERANCE {
                            debug!(
                                source,
                                line,
                                reported = rec.delivery_pct,
                                computed,
                                "delivery % disagrees with quantities"
                            );
                        }
                    }
                    records.push(rec);
                }
                Err(reason) => {
                    debug!(source, line, %reason, "row skipped");
                    row_issues.push(RowIssue { line, reason });
                }
            }
        }

        if !row_issues.is_empty() {
            warn!(source, dropped = row_issues.len(), "rows skipped during cleaning");
        }
        info!(source, rows_read, kept = records.len(), "loaded CSV");

        Ok(LoadedFile {
            source: source.to_string(),
            records,
            rows_read,
            row_issues,
        })
    }

    /// Turn one CSV row into a record, or explain why it is unusable.
    fn parse_row(
        &self,
        record: &StringRecord,
        columns: &ColumnMap,
    ) -> std::result::Result<DeliveryRecord, String> {
        let markers = &self.missing_markers;
        let cell = |col: Column| columns.get(record, col).unwrap_or("");

        let date_raw = cell(Column::Date);
        let date = parse_date(date_raw, &self.date_formats)
            .ok_or_else(|| format!("unparseable date '{date_raw}'"))?;

        let symbol = cell(Column::Symbol);
        if is_missing(symbol, markers) {
            return Err("missing symbol".to_string());
        }

        let traded_qty = parse_quantity(cell(Column::TradedQty), markers)
            .ok_or_else(|| format!("invalid traded_qty '{}'", cell(Column::TradedQty)))?;
        let deliverable_qty = parse_quantity(cell(Column::DeliverableQty), markers)
            .ok_or_else(|| {
                format!("invalid deliverable_qty '{}'", cell(Column::DeliverableQty))
            })?;
        let delivery_pct = parse_number(cell(Column::DeliveryPct), markers)
            .ok_or_else(|| format!("invalid delivery_pct '{}'", cell(Column::DeliveryPct)))?;

        let open = columns
            .get(record, Column::Open)
            .and_then(|v| parse_number(v, markers));
        let close = columns
            .get(record, Column::Close)
            .and_then(|v| parse_number(v, markers));

        // Without an open column, net value falls back to deliverable quantity.
        let net_value = if columns.has(Column::Open) {
            open.map(|px| deliverable_qty as f64 * px)
        } else {
            Some(deliverable_qty as f64)
        };

        Ok(DeliveryRecord {
            symbol: symbol.to_string(),
            date,
            traded_qty,
            deliverable_qty,
            delivery_pct,
            open,
            close,
            net_value,
        })
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(&IngestConfig::default())
    }
}
