//! Dataset assembly from one or more loaded files.

use crate::loader::LoadedFile;
use chrono::NaiveDate;
use delivery_core::{DateRange, DeliveryRecord};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Merged, de-duplicated records ordered by date.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<DeliveryRecord>,
}

impl Dataset {
    /// Build a dataset from records already in the desired order.
    pub fn from_records(records: Vec<DeliveryRecord>) -> Self {
        Self { records }
    }

    /// All records.
    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.symbol.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest dates present.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        // Records are sorted by date.
        Some((self.records.first()?.date, self.records.last()?.date))
    }

    /// Records whose date falls inside `range`.
    pub fn filter_range(&self, range: &DateRange) -> Dataset {
        if range.is_unbounded() {
            return self.clone();
        }
        Dataset {
            records: self
                .records
                .iter()
                .filter(|r| range.contains(r.date))
                .cloned()
                .collect(),
        }
    }
}

/// Concatenate files in order, keep the first record per `(symbol, date)` and
/// sort by date. Records sharing a date keep their input order.
pub fn merge(files: Vec<LoadedFile>) -> Dataset {
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut records = Vec::new();
    let mut duplicates = 0usize;

    for file in files {
        for rec in file.records {
            if seen.insert((rec.symbol.clone(), rec.date)) {
                records.push(rec);
            } else {
                duplicates += 1;
            }
        }
    }

    records.sort_by_key(|r| r.date);
    debug!(kept = records.len(), duplicates, "merged input files");

    Dataset { records }
}
