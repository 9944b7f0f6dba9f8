//! Price analytics over a single ticker's history.
//!
//! `primitives` holds the pure numeric helpers; `windows` slices a series by
//! date range or preset; `risk` derives the trailing-year statistics.

pub mod primitives;
pub mod risk;
pub mod windows;

pub use primitives::{
    annualized_volatility, extremes, percent_change, sample_std_dev, simple_returns,
    TRADING_DAYS_PER_YEAR,
};
pub use risk::{compute_stats, trailing_year, RiskStats, RiskStatsEngine, TRAILING_YEAR_DAYS};
pub use windows::{window, PeriodWindow, PeriodWindower, UnknownPreset, WindowPreset};
