//! Header normalization and column resolution.
//!
//! Exports from different sources name the same field differently
//! ("Total Traded Quantity", "QTY_TRADED", "Deliverable Qty"). Headers are
//! normalized and mapped onto a small set of canonical columns.

use csv::StringRecord;
use delivery_core::{Error, Result};
use std::collections::HashMap;

/// Canonical columns understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Symbol,
    Date,
    TradedQty,
    DeliverableQty,
    DeliveryPct,
    Open,
    Close,
}

impl Column {
    /// Columns every input file must carry, in reporting order.
    pub const REQUIRED: [Column; 5] = [
        Column::Symbol,
        Column::Date,
        Column::TradedQty,
        Column::DeliverableQty,
        Column::DeliveryPct,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Column::Symbol => "symbol",
            Column::Date => "date",
            Column::TradedQty => "traded_qty",
            Column::DeliverableQty => "deliverable_qty",
            Column::DeliveryPct => "delivery_pct",
            Column::Open => "open",
            Column::Close => "close",
        }
    }
}

/// Normalize a raw header: strip BOM, trim, lowercase, spaces to underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

/// Map a normalized header onto a canonical column.
pub fn canonical_column(normalized: &str) -> Option<Column> {
    match normalized {
        "symbol" => Some(Column::Symbol),
        "date" => Some(Column::Date),
        "qty_traded" | "total_traded_quantity" | "traded_qty" => Some(Column::TradedQty),
        "deliverable_qty" | "delivered_qty" => Some(Column::DeliverableQty),
        "delivery_pct" | "delivery_percentage" | "delivery_percent" | "%_dly_qt_to_traded_qty" => {
            Some(Column::DeliveryPct)
        }
        "open_price" | "open" => Some(Column::Open),
        "close_price" | "close" => Some(Column::Close),
        _ => None,
    }
}

/// Resolved positions of canonical columns within a header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    /// Resolve a header row. The first occurrence of a column wins.
    ///
    /// Fails with [`Error::MissingColumns`] when a required column is absent.
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut indices = HashMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            if let Some(col) = canonical_column(&normalize_header(raw)) {
                indices.entry(col).or_insert(idx);
            }
        }

        let missing: Vec<&str> = Column::REQUIRED
            .iter()
            .filter(|c| !indices.contains_key(c))
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_columns(missing));
        }

        Ok(Self { indices })
    }

    /// Position of a column, if present.
    pub fn index(&self, col: Column) -> Option<usize> {
        self.indices.get(&col).copied()
    }

    /// Whether a column is present.
    pub fn has(&self, col: Column) -> bool {
        self.indices.contains_key(&col)
    }

    /// Fetch a column's raw value from a record.
    pub fn get<'r>(&self, record: &'r StringRecord, col: Column) -> Option<&'r str> {
        self.index(col).and_then(|i| record.get(i))
    }
}
