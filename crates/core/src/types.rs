//! Core data types for the delivery analytics system.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Shares per million.
pub const MILLION: f64 = 1e6;

/// Rupees per crore.
pub const CRORE: f64 = 1e7;

/// Round to two decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Express a quantity in millions, rounded to 2 dp.
#[inline]
pub fn to_millions(qty: f64) -> f64 {
    round2(qty / MILLION)
}

/// Express a rupee value in crores, rounded to 2 dp.
#[inline]
pub fn to_crores(value: f64) -> f64 {
    round2(value / CRORE)
}

/// Percent change from `prev` to `curr`.
///
/// `None` when there is no meaningful base (previous value of zero).
#[inline]
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev * 100.0)
    }
}

/// One day of trading data for one symbol, after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Ticker symbol.
    pub symbol: String,
    /// Trading date.
    pub date: NaiveDate,
    /// Total traded quantity.
    pub traded_qty: u64,
    /// Quantity marked for delivery.
    pub deliverable_qty: u64,
    /// Delivery percentage as reported in the source file.
    pub delivery_pct: f64,
    /// Opening price, when the source carries one.
    pub open: Option<f64>,
    /// Closing price, when the source carries one.
    pub close: Option<f64>,
    /// Deliverable quantity times open price (times 1 without an open column).
    pub net_value: Option<f64>,
}

impl DeliveryRecord {
    /// Delivery percentage recomputed from the quantities.
    pub fn computed_delivery_pct(&self) -> Option<f64> {
        if self.traded_qty == 0 {
            None
        } else {
            Some(100.0 * self.deliverable_qty as f64 / self.traded_qty as f64)
        }
    }
}

/// Calendar bucket used for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl Period {
    /// All periods, in report order.
    pub const ALL: [Period; 6] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::Quarterly,
        Period::HalfYearly,
        Period::Yearly,
    ];

    /// Machine-readable identifier, as used in config files and CSV output.
    pub fn key(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::HalfYearly => "half-yearly",
            Period::Yearly => "yearly",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Quarterly => "Quarterly",
            Period::HalfYearly => "Half-Yearly",
            Period::Yearly => "Yearly",
        }
    }

    /// Section anchor for the period's table.
    pub fn anchor(self) -> String {
        format!("{}-delivery-table", self.label().to_lowercase())
    }

    /// Whether period-over-period change columns are produced.
    pub fn tracks_change(self) -> bool {
        matches!(self, Period::Daily | Period::Weekly | Period::Monthly)
    }

    /// First day of the bucket containing `date`.
    ///
    /// Weeks run Monday through Sunday.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        let first_of_month = |month: u32| {
            NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
        };
        match self {
            Period::Daily => date,
            Period::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Period::Monthly => first_of_month(date.month()),
            Period::Quarterly => first_of_month((date.month0() / 3) * 3 + 1),
            Period::HalfYearly => first_of_month(if date.month() <= 6 { 1 } else { 7 }),
            Period::Yearly => first_of_month(1),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(period) = Period::ALL.into_iter().find(|p| p.key() == s) {
            return Ok(period);
        }
        match s.as_str() {
            "d" => Ok(Period::Daily),
            "w" => Ok(Period::Weekly),
            "m" => Ok(Period::Monthly),
            "q" => Ok(Period::Quarterly),
            "halfyearly" | "h" | "2h" => Ok(Period::HalfYearly),
            "y" => Ok(Period::Yearly),
            other => Err(Error::config(format!("unknown period '{other}'"))),
        }
    }
}

/// Inclusive date range; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included.
    pub from: Option<NaiveDate>,
    /// Last date included.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Create a new range.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Check whether `date` falls inside the range.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// Whether both ends are open.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// An inverted range is rejected.
    pub fn validate(&self) -> crate::Result<()> {
        match (self.from, self.to) {
            (Some(f), Some(t)) if f > t => Err(Error::config(format!(
                "date range start {f} is after end {t}"
            ))),
            _ => Ok(()),
        }
    }
}
