//! Calendar-period aggregation of delivery data.
//!
//! Records are grouped by `(period start, symbol)`. Quantities and net value
//! are summed, and delivery % is recomputed from the summed quantities.

use chrono::NaiveDate;
use delivery_core::{pct_change, to_crores, to_millions, Period};
use delivery_ingestion::Dataset;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One aggregated `(period, symbol)` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// First day of the period.
    pub period: NaiveDate,
    pub symbol: String,
    /// Summed traded quantity.
    pub traded_qty: u64,
    /// Summed deliverable quantity.
    pub deliverable_qty: u64,
    /// Summed net value in rupees.
    pub net_value: f64,
    pub traded_qty_mn: f64,
    pub deliverable_qty_mn: f64,
    /// `None` when nothing traded in the period.
    pub delivery_pct: Option<f64>,
    pub net_value_crore: f64,
    /// Change against the symbol's previous period (daily/weekly/monthly only).
    pub traded_qty_chg_pct: Option<f64>,
    pub deliverable_qty_chg_pct: Option<f64>,
    /// Net value exceeded the alert threshold.
    pub net_value_flagged: bool,
}

/// Aggregated table for one period type.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodTable {
    pub period: Period,
    pub rows: Vec<AggregateRow>,
}

impl PeriodTable {
    /// Rows whose net value crossed the alert threshold.
    pub fn flagged(&self) -> impl Iterator<Item = &AggregateRow> {
        self.rows.iter().filter(|r| r.net_value_flagged)
    }
}

/// Running sums for a group.
#[derive(Debug, Default)]
struct GroupTotals {
    traded_qty: u64,
    deliverable_qty: u64,
    net_value: f64,
    /// A quantity sum hit `u64::MAX`.
    saturated: bool,
}

impl GroupTotals {
    /// Add one record. Returns true the first time a quantity sum saturates.
    fn add(&mut self, traded_qty: u64, deliverable_qty: u64, net_value: f64) -> bool {
        let traded = self.traded_qty.checked_add(traded_qty);
        let deliverable = self.deliverable_qty.checked_add(deliverable_qty);
        self.traded_qty = traded.unwrap_or(u64::MAX);
        self.deliverable_qty = deliverable.unwrap_or(u64::MAX);
        self.net_value += net_value;

        let overflowed = traded.is_none() || deliverable.is_none();
        let newly = overflowed && !self.saturated;
        self.saturated |= overflowed;
        newly
    }
}

/// Period aggregator.
pub struct Aggregator {
    net_value_threshold_crore: f64,
}

impl Aggregator {
    /// Create an aggregator flagging net values above the threshold (in crores).
    pub fn new(net_value_threshold_crore: f64) -> Self {
        Self {
            net_value_threshold_crore,
        }
    }

    /// Aggregate a dataset into one table.
    ///
    /// Change-tracking periods are ordered by symbol then period; the rest by
    /// period then symbol.
    pub fn aggregate(&self, dataset: &Dataset, period: Period) -> PeriodTable {
        // Keyed (symbol, period start) so each symbol's periods are contiguous.
        let mut groups: BTreeMap<(String, NaiveDate), GroupTotals> = BTreeMap::new();
        for rec in dataset.records() {
            let key = (rec.symbol.clone(), period.start_of(rec.date));
            let totals = groups.entry(key).or_default();
            if totals.add(rec.traded_qty, rec.deliverable_qty, rec.net_value.unwrap_or(0.0)) {
                warn!(symbol = %rec.symbol, %period, "quantity total saturated at u64::MAX");
            }
        }

        let mut rows = Vec::with_capacity(groups.len());
        let mut prev: Option<(&str, u64, u64)> = None;

        for ((symbol, start), totals) in &groups {
            let (traded_chg, deliverable_chg) = match prev {
                Some((prev_symbol, prev_traded, prev_deliverable))
                    if period.tracks_change() && prev_symbol == symbol.as_str() =>
                {
                    (
                        pct_change(prev_traded as f64, totals.traded_qty as f64),
                        pct_change(prev_deliverable as f64, totals.deliverable_qty as f64),
                    )
                }
                _ => (None, None),
            };
            prev = Some((symbol.as_str(), totals.traded_qty, totals.deliverable_qty));

            rows.push(self.make_row(*start, symbol, totals, traded_chg, deliverable_chg));
        }

        if !period.tracks_change() {
            rows.sort_by(|a, b| (a.period, &a.symbol).cmp(&(b.period, &b.symbol)));
        }

        PeriodTable { period, rows }
    }

    /// Aggregate a dataset for several periods.
    pub fn aggregate_all(&self, dataset: &Dataset, periods: &[Period]) -> Vec<PeriodTable> {
        periods.iter().map(|p| self.aggregate(dataset, *p)).collect()
    }

    fn make_row(
        &self,
        period: NaiveDate,
        symbol: &str,
        totals: &GroupTotals,
        traded_qty_chg_pct: Option<f64>,
        deliverable_qty_chg_pct: Option<f64>,
    ) -> AggregateRow {
        let delivery_pct = if totals.traded_qty > 0 {
            Some(100.0 * totals.deliverable_qty as f64 / totals.traded_qty as f64)
        } else {
            None
        };
        let net_value_crore = to_crores(totals.net_value);

        AggregateRow {
            period,
            symbol: symbol.to_string(),
            traded_qty: totals.traded_qty,
            deliverable_qty: totals.deliverable_qty,
            net_value: totals.net_value,
            traded_qty_mn: to_millions(totals.traded_qty as f64),
            deliverable_qty_mn: to_millions(totals.deliverable_qty as f64),
            delivery_pct,
            net_value_crore,
            traded_qty_chg_pct,
            deliverable_qty_chg_pct,
            net_value_flagged: net_value_crore > self.net_value_threshold_crore,
        }
    }
}
