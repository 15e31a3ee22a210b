//! Delivery % spike detection.

use chrono::NaiveDate;
use delivery_ingestion::Dataset;
use serde::Serialize;

/// A day on which a symbol's delivery % reached the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spike {
    pub date: NaiveDate,
    pub symbol: String,
    pub delivery_pct: f64,
}

/// Rows with `delivery_pct >= threshold_pct`, in dataset order.
pub fn detect_spikes(dataset: &Dataset, threshold_pct: f64) -> Vec<Spike> {
    dataset
        .records()
        .iter()
        .filter(|r| r.delivery_pct >= threshold_pct)
        .map(|r| Spike {
            date: r.date,
            symbol: r.symbol.clone(),
            delivery_pct: r.delivery_pct,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_core::DeliveryRecord;

    fn rec(symbol: &str, day: u32, pct: f64) -> DeliveryRecord {
        DeliveryRecord {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            traded_qty: 1000,
            deliverable_qty: 500,
            delivery_pct: pct,
            open: None,
            close: None,
            net_value: None,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ds = Dataset::from_records(vec![
            rec("TCS", 1, 74.9),
            rec("INFY", 1, 75.0),
            rec("TCS", 2, 90.0),
        ]);
        let spikes = detect_spikes(&ds, 75.0);
        assert_eq!(spikes.len(), 2);
        assert_eq!(spikes[0].symbol, "INFY");
        assert_eq!(spikes[1].delivery_pct, 90.0);
    }

    #[test]
    fn test_no_spikes() {
        let ds = Dataset::from_records(vec![rec("TCS", 1, 10.0)]);
        assert!(detect_spikes(&ds, 75.0).is_empty());
    }
}
