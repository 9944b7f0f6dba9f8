use crate::symbol::Symbol;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single observation: trading date and adjusted close price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date of the observation
    pub date: NaiveDate,
    /// Adjusted close price on that date
    pub adjusted_close: f64,
}

impl PricePoint {
    /// Creates a new PricePoint.
    pub fn new(date: NaiveDate, adjusted_close: f64) -> Self {
        PricePoint {
            date,
            adjusted_close,
        }
    }
}

/// Date range for querying time-series data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange. `start > end` is allowed and describes an
    /// empty range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Returns true if no date can fall inside the range.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Price history for exactly one symbol.
///
/// Observations are kept sorted ascending by date with no duplicate dates.
/// The series is immutable once built; every derived view is a copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from observations in any order.
    ///
    /// # Errors
    /// Returns an error if two observations share a date or if any price is
    /// non-finite or not strictly positive.
    pub fn new(symbol: Symbol, mut points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if let Some(bad) = points.iter().find(|p| !is_valid_price(p.adjusted_close)) {
            return Err(SeriesError::InvalidPrice {
                date: bad.date,
                price: bad.adjusted_close,
            });
        }

        points.sort_by_key(|p| p.date);

        if let Some(pair) = points.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(SeriesError::DuplicateDate(pair[0].date));
        }

        Ok(PriceSeries { symbol, points })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Observations in ascending date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Adjusted close prices in ascending date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.adjusted_close).collect()
    }

    /// Latest observation dated on or before `date`.
    pub fn latest_at_or_before(&self, date: NaiveDate) -> Option<&PricePoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| &self.points[i])
    }

    /// Observations within `range`, inclusive on both ends.
    ///
    /// Returns an empty slice when the range is empty.
    pub fn slice(&self, range: &DateRange) -> &[PricePoint] {
        if range.is_empty() {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.date < range.start);
        let hi = self.points.partition_point(|p| p.date <= range.end);
        &self.points[lo..hi]
    }
}

pub(crate) fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Errors raised while building a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Two observations share the same date
    DuplicateDate(NaiveDate),
    /// Price is zero, negative, NaN or infinite
    InvalidPrice { date: NaiveDate, price: f64 },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesError::DuplicateDate(date) => write!(f, "Duplicate observation for {}", date),
            SeriesError::InvalidPrice { date, price } => {
                write!(f, "Invalid price {} on {}", price, date)
            }
        }
    }
}

impl std::error::Error for SeriesError {}

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a calendar date from the textual forms found in snapshots.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// and RFC 3339 timestamps. The time component is discarded.
pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    let text = text.trim();
    let date_only = NaiveDate::parse_from_str(text, "%Y-%m-%d");
    if date_only.is_ok() {
        return date_only;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.date_naive());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(timestamp.date());
        }
    }

    date_only
}

/// Converts epoch milliseconds (pandas' default JSON date encoding) to a
/// UTC calendar date.
pub fn date_from_epoch_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|ts| ts.date_naive())
}
