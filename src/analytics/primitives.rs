//! Stateless numeric primitives used by the period windower and the risk
//! statistics engine.
//!
//! These are pure functions over slices of prices or returns. Invalid input
//! (non-positive or non-finite prices, too few values) yields `None` rather
//! than a sentinel value so that callers can surface the statistic as absent.

use crate::time_series::is_valid_price;

/// Trading days used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Percentage change from `from` to `to`: `(to / from - 1) * 100`.
///
/// Returns `None` when either price is non-positive or non-finite.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if !is_valid_price(from) || !is_valid_price(to) {
        return None;
    }
    let change = (to / from - 1.0) * 100.0;
    change.is_finite().then_some(change)
}

/// Simple period-over-period returns `P_t / P_{t-1} - 1` for adjacent prices.
///
/// Pairs involving an invalid price are skipped. The output has at most
/// `prices.len() - 1` values.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|pair| is_valid_price(pair[0]) && is_valid_price(pair[1]))
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

/// Sample standard deviation (N - 1 denominator) of the non-NaN values.
///
/// Returns `None` when fewer than two valid values are available.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let valid_values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();

    if valid_values.len() < 2 {
        return None;
    }

    let n = valid_values.len() as f64;
    let mean = valid_values.iter().sum::<f64>() / n;
    let sum_squared_diff: f64 = valid_values
        .iter()
        .map(|&value| (value - mean).powi(2))
        .sum();

    Some((sum_squared_diff / (n - 1.0)).sqrt())
}

/// Annualized volatility in percent: `sample_std_dev(returns) * sqrt(252) * 100`.
pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    sample_std_dev(returns).map(|std_dev| std_dev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Highest and lowest value of a non-empty slice.
pub fn extremes(values: &[f64]) -> Option<(f64, f64)> {
    let (first, rest) = values.split_first()?;
    Some(rest.iter().fold((*first, *first), |(high, low), &value| {
        (high.max(value), low.min(value))
    }))
}
