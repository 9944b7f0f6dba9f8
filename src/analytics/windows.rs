//! Period windowing: the in-range slice of a price history and the
//! percentage change across it.
//!
//! The windower is period-agnostic and only accepts concrete dates. The
//! dashboard's preset periods live in [`WindowPreset`] and resolve to a
//! [`DateRange`] before reaching the windower.

use crate::analytics::primitives::percent_change;
use crate::snapshot::DataProvider;
use crate::time_series::{DateRange, PricePoint, PriceSeries};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Read-only view of the observations between two dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodWindow {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Observations in strictly ascending date order
    pub observations: Vec<PricePoint>,
    /// `(last / first - 1) * 100`; absent when the window is empty
    pub percent_change: Option<f64>,
}

impl PeriodWindow {
    /// A window with no observations and no percentage change.
    pub fn empty(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        PeriodWindow {
            ticker: ticker.into(),
            start,
            end,
            observations: Vec::new(),
            percent_change: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Extracts the observations of `series` within `[start, end]` (inclusive)
/// and computes the percentage change from the first to the last one.
///
/// `start > end` yields an empty window. A single observation yields a
/// change of exactly zero.
pub fn window(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> PeriodWindow {
    let range = DateRange::new(start, end);
    let observations = series.slice(&range).to_vec();

    let percent_change = match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => percent_change(first.adjusted_close, last.adjusted_close),
        _ => None,
    };

    PeriodWindow {
        ticker: series.symbol().to_string(),
        start,
        end,
        observations,
        percent_change,
    }
}

/// Windower bound to a snapshot handle, looking series up by ticker.
pub struct PeriodWindower<'a, P: DataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: DataProvider + ?Sized> PeriodWindower<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        PeriodWindower { provider }
    }

    /// Window for `ticker`. Unknown tickers produce an empty window.
    pub fn window(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> PeriodWindow {
        match self.provider.get_series(ticker) {
            Some(series) => window(series, start, end),
            None => {
                debug!(ticker, "no price series for ticker, returning empty window");
                PeriodWindow::empty(ticker, start, end)
            }
        }
    }

    /// Window for `ticker` over a preset period ending at `end`.
    pub fn preset_window(&self, ticker: &str, preset: WindowPreset, end: NaiveDate) -> PeriodWindow {
        match self.provider.get_series(ticker) {
            Some(series) => {
                let range = preset.range(series, end);
                window(series, range.start, range.end)
            }
            None => PeriodWindow::empty(ticker, preset.start_without_history(end), end),
        }
    }
}

/// Lookback periods offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowPreset {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "15d")]
    FifteenDays,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "5y")]
    FiveYears,
    #[default]
    #[serde(rename = "max")]
    Max,
}

impl WindowPreset {
    pub const ALL: [WindowPreset; 5] = [
        WindowPreset::OneDay,
        WindowPreset::FifteenDays,
        WindowPreset::OneMonth,
        WindowPreset::FiveYears,
        WindowPreset::Max,
    ];

    /// Calendar days of lookback, `None` for the whole history.
    pub fn days(&self) -> Option<u64> {
        match self {
            WindowPreset::OneDay => Some(1),
            WindowPreset::FifteenDays => Some(15),
            WindowPreset::OneMonth => Some(30),
            WindowPreset::FiveYears => Some(1825),
            WindowPreset::Max => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindowPreset::OneDay => "1 Day",
            WindowPreset::FifteenDays => "15 Days",
            WindowPreset::OneMonth => "1 Month",
            WindowPreset::FiveYears => "5 Years",
            WindowPreset::Max => "Max",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WindowPreset::OneDay => "1d",
            WindowPreset::FifteenDays => "15d",
            WindowPreset::OneMonth => "1m",
            WindowPreset::FiveYears => "5y",
            WindowPreset::Max => "max",
        }
    }

    /// Resolves the preset to a concrete range ending at `end`.
    ///
    /// `Max` starts at the earliest observation of `series`.
    pub fn range(&self, series: &PriceSeries, end: NaiveDate) -> DateRange {
        let start = match self.days() {
            Some(_) => self.start_without_history(end),
            None => series.first().map_or(end, |p| p.date),
        };
        DateRange::new(start, end)
    }

    fn start_without_history(&self, end: NaiveDate) -> NaiveDate {
        match self.days() {
            Some(days) => end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN),
            None => end,
        }
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error returned when a period name matches no preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown period '{}' (expected one of 1d, 15d, 1m, 5y, max)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPreset {}

impl FromStr for WindowPreset {
    type Err = UnknownPreset;

    /// Accepts either the short code ("15d") or the label ("15 Days"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WindowPreset::ALL
            .into_iter()
            .find(|preset| {
                preset.code().eq_ignore_ascii_case(wanted)
                    || preset.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
