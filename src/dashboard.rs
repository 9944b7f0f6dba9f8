//! View models consumed by the presentation layer.
//!
//! A [`TickerDashboard`] gathers everything shown for one selected ticker:
//! the model's prediction, the price window for the chosen period, the risk
//! statistics as of the prediction date and the backtest metrics.

use crate::analytics::risk::{RiskStats, RiskStatsEngine};
use crate::analytics::windows::{PeriodWindow, PeriodWindower, WindowPreset};
use crate::prediction::{Action, BacktestSummary, Movement, Probabilities};
use crate::snapshot::{DataProvider, EconomicIndicators};
use crate::time_series::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;

/// Market index shown alongside every ticker.
pub const DEFAULT_MARKET_INDEX: &str = "^GSPC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerDashboard {
    pub ticker: String,
    /// Prediction date, used as the reference date for every statistic
    pub as_of: NaiveDate,
    pub price: f64,
    pub action: Action,
    pub probabilities: Probabilities,
    pub dominant_movement: Movement,
    pub period: WindowPreset,
    pub window: PeriodWindow,
    pub stats: RiskStats,
    pub backtest: Option<BacktestSummary>,
}

/// Builds the dashboard for `ticker` over the `period` preset.
///
/// Returns `None` when the snapshot holds no prediction for the ticker.
pub fn build_dashboard<P: DataProvider + ?Sized>(
    provider: &P,
    ticker: &str,
    period: WindowPreset,
) -> Option<TickerDashboard> {
    let prediction = provider.get_prediction(ticker)?;
    let as_of = prediction.as_of;

    let window = PeriodWindower::new(provider).preset_window(ticker, period, as_of);
    let stats = RiskStatsEngine::new(provider).compute_stats(ticker, as_of);

    Some(TickerDashboard {
        ticker: ticker.to_string(),
        as_of,
        price: prediction.price,
        action: prediction.action,
        probabilities: prediction.probabilities,
        dominant_movement: prediction.probabilities.dominant(),
        period,
        window,
        stats,
        backtest: provider.get_backtest(ticker).cloned(),
    })
}

/// Economic backdrop and broad-market index history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub economic: EconomicIndicators,
    pub index_symbol: String,
    pub index: Option<PriceSeries>,
}

pub fn market_overview<P: DataProvider + ?Sized>(provider: &P, index_symbol: &str) -> MarketOverview {
    MarketOverview {
        economic: provider.get_economic_indicators().clone(),
        index_symbol: index_symbol.to_string(),
        index: provider.get_market_index_series(index_symbol).cloned(),
    }
}
