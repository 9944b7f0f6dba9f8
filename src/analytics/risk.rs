//! Risk statistics for a ticker as of a reference date.
//!
//! Each statistic is derived independently and is absent when the history
//! cannot support it; missing data never turns into an error.

use crate::analytics::primitives::{annualized_volatility, extremes, percent_change, simple_returns};
use crate::snapshot::DataProvider;
use crate::time_series::{DateRange, PricePoint, PriceSeries};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// Calendar days covered by the trailing-year window.
pub const TRAILING_YEAR_DAYS: u64 = 365;

/// Summary statistics for one ticker and reference date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStats {
    pub reference_date: NaiveDate,
    /// Date of the observation used as the current price
    pub anchor_date: Option<NaiveDate>,
    pub current_price: Option<f64>,
    /// Percent return against the earliest observation of the trailing year
    pub one_year_return: Option<f64>,
    /// Annualized volatility of simple returns, in percent
    pub annualized_volatility: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    /// `(current / week52_high - 1) * 100`
    pub distance_from_high: Option<f64>,
    /// `(current / week52_low - 1) * 100`
    pub distance_from_low: Option<f64>,
}

impl RiskStats {
    /// Stats with every field absent.
    pub fn absent(reference_date: NaiveDate) -> Self {
        RiskStats {
            reference_date,
            anchor_date: None,
            current_price: None,
            one_year_return: None,
            annualized_volatility: None,
            week52_high: None,
            week52_low: None,
            distance_from_high: None,
            distance_from_low: None,
        }
    }
}

/// The 365-day window ending at `reference_date`, inclusive on both ends.
pub fn trailing_year(reference_date: NaiveDate) -> DateRange {
    let start = reference_date
        .checked_sub_days(Days::new(TRAILING_YEAR_DAYS))
        .unwrap_or(NaiveDate::MIN);
    DateRange::new(start, reference_date)
}

/// Computes [`RiskStats`] for `series` as of `reference_date`.
///
/// The current price is the latest observation on or before the reference
/// date. Without one, every field is absent. Volatility uses the whole
/// series; the return and 52-week figures use the trailing year only.
pub fn compute_stats(series: &PriceSeries, reference_date: NaiveDate) -> RiskStats {
    let mut stats = RiskStats::absent(reference_date);

    let Some(anchor) = series.latest_at_or_before(reference_date) else {
        debug!(
            symbol = %series.symbol(),
            %reference_date,
            "no observation on or before reference date"
        );
        return stats;
    };
    let current = anchor.adjusted_close;
    stats.anchor_date = Some(anchor.date);
    stats.current_price = Some(current);

    let trailing = series.slice(&trailing_year(reference_date));

    stats.one_year_return = trailing
        .first()
        .and_then(|earliest| percent_change(earliest.adjusted_close, current));

    stats.annualized_volatility = annualized_volatility(&simple_returns(&series.closes()));

    if let Some((high, low)) = extremes(&closes_of(trailing)) {
        stats.week52_high = Some(high);
        stats.week52_low = Some(low);
    }

    stats.distance_from_high = stats.week52_high.and_then(|high| percent_change(high, current));
    stats.distance_from_low = stats.week52_low.and_then(|low| percent_change(low, current));

    stats
}

fn closes_of(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.adjusted_close).collect()
}

/// Stats engine bound to a snapshot handle, looking series up by ticker.
pub struct RiskStatsEngine<'a, P: DataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: DataProvider + ?Sized> RiskStatsEngine<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        RiskStatsEngine { provider }
    }

    /// Stats for `ticker`; unknown tickers yield all-absent stats.
    pub fn compute_stats(&self, ticker: &str, reference_date: NaiveDate) -> RiskStats {
        match self.provider.get_series(ticker) {
            Some(series) => compute_stats(series, reference_date),
            None => {
                debug!(ticker, "no price series for ticker, stats absent");
                RiskStats::absent(reference_date)
            }
        }
    }
}
