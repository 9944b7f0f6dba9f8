//! HTTP request handlers for API endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::analytics::risk::{RiskStats, RiskStatsEngine};
use crate::analytics::windows::{PeriodWindow, PeriodWindower, WindowPreset};
use crate::dashboard::{build_dashboard, TickerDashboard, DEFAULT_MARKET_INDEX};
use crate::prediction::{BacktestSummary, PredictionRecord};
use crate::snapshot::{DataProvider, Inflation, Section, Snapshot};
use crate::time_series::{parse_date, PriceSeries};

/// Health check endpoint
///
/// Reports whether a snapshot is loaded.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "data_available": state.has_data(),
    }))
}

/// Preset period offered to clients
#[derive(Debug, Serialize)]
pub struct PeriodInfo {
    pub code: &'static str,
    pub label: &'static str,
    pub days: Option<u64>,
}

/// Response for ticker listing
#[derive(Debug, Serialize)]
pub struct TickersResponse {
    pub tickers: Vec<String>,
    pub periods: Vec<PeriodInfo>,
    pub default_period: WindowPreset,
    /// Malformed snapshot entries dropped at load time
    pub issues: usize,
}

/// GET /tickers - Tickers with a prediction and the selectable periods
pub async fn list_tickers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TickersResponse>, ApiError> {
    let snapshot = state.snapshot()?;

    let periods = WindowPreset::ALL
        .iter()
        .map(|preset| PeriodInfo {
            code: preset.code(),
            label: preset.label(),
            days: preset.days(),
        })
        .collect();

    Ok(Json(TickersResponse {
        tickers: snapshot.tickers().iter().map(|s| s.to_string()).collect(),
        periods,
        default_period: WindowPreset::default(),
        issues: snapshot.issues().len(),
    }))
}

/// Query parameters selecting a preset period
#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub period: Option<String>,
}

fn parse_period(period: Option<&str>) -> Result<WindowPreset, ApiError> {
    match period {
        Some(text) => Ok(text.parse()?),
        None => Ok(WindowPreset::default()),
    }
}

fn parse_date_param(name: &str, text: &str) -> Result<NaiveDate, ApiError> {
    parse_date(text)
        .map_err(|e| ApiError::InvalidDate(format!("Invalid {} date '{}': {}", name, text, e)))
}

/// Reference date for a ticker when the client gives none: the prediction
/// date, else the last observation, else today. Tickers without data then
/// resolve to an empty window, as with explicit dates.
fn default_reference_date(snapshot: &Snapshot, ticker: &str) -> NaiveDate {
    snapshot
        .get_prediction(ticker)
        .map(|prediction| prediction.as_of)
        .or_else(|| {
            snapshot
                .get_series(ticker)
                .and_then(|series| series.last().map(|p| p.date))
        })
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// GET /tickers/{ticker}/dashboard - Everything shown for one ticker
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<TickerDashboard>, ApiError> {
    let snapshot = state.snapshot()?;
    let period = parse_period(params.period.as_deref())?;

    build_dashboard(snapshot, &ticker, period)
        .map(Json)
        .ok_or(ApiError::TickerNotFound(ticker))
}

/// Query parameters for the window endpoint
///
/// Either a preset `period` or an explicit `start`/`end` pair.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// GET /tickers/{ticker}/window - Price window and percentage change
pub async fn get_window(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<WindowParams>,
) -> Result<Json<PeriodWindow>, ApiError> {
    let snapshot = state.snapshot()?;
    let windower = PeriodWindower::new(snapshot);

    match (params.start.as_deref(), params.end.as_deref()) {
        (Some(start), Some(end)) => {
            if params.period.is_some() {
                return Err(ApiError::InvalidParameter(
                    "Use either period or start/end, not both".to_string(),
                ));
            }
            let start = parse_date_param("start", start)?;
            let end = parse_date_param("end", end)?;
            // An inverted range is a valid, empty window
            Ok(Json(windower.window(&ticker, start, end)))
        }
        (None, None) => {
            let period = parse_period(params.period.as_deref())?;
            let end = default_reference_date(snapshot, &ticker);
            Ok(Json(windower.preset_window(&ticker, period, end)))
        }
        _ => Err(ApiError::InvalidParameter(
            "start and end must be given together".to_string(),
        )),
    }
}

/// Query parameters for the stats endpoint
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub date: Option<String>,
}

/// GET /tickers/{ticker}/stats - Risk statistics as of a reference date
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<RiskStats>, ApiError> {
    let snapshot = state.snapshot()?;
    let reference_date = match params.date.as_deref() {
        Some(text) => parse_date_param("reference", text)?,
        None => default_reference_date(snapshot, &ticker),
    };

    Ok(Json(
        RiskStatsEngine::new(snapshot).compute_stats(&ticker, reference_date),
    ))
}

/// GET /tickers/{ticker}/prediction - Model prediction for a ticker
pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<PredictionRecord>, ApiError> {
    let snapshot = state.snapshot()?;
    snapshot
        .get_prediction(&ticker)
        .cloned()
        .map(Json)
        .ok_or(ApiError::TickerNotFound(ticker))
}

/// GET /tickers/{ticker}/backtest - Backtest metrics for a ticker
pub async fn get_backtest(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<BacktestSummary>, ApiError> {
    let snapshot = state.snapshot()?;
    snapshot
        .get_backtest(&ticker)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No backtest results for '{}'", ticker)))
}

/// Response for the economic indicators endpoint
#[derive(Debug, Serialize)]
pub struct EconomicResponse {
    pub unemployment_rate: Option<f64>,
    pub interest_rate: Option<f64>,
    pub inflation: Option<Inflation>,
    /// Every indicator in the snapshot, by name
    pub indicators: Value,
}

/// GET /economic - Economic conditions
pub async fn get_economic(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EconomicResponse>, ApiError> {
    let economic = state.snapshot()?.get_economic_indicators();

    Ok(Json(EconomicResponse {
        unemployment_rate: economic.unemployment_rate(),
        interest_rate: economic.interest_rate(),
        inflation: economic.inflation(),
        indicators: serde_json::to_value(economic)?,
    }))
}

/// GET /market/{symbol} - Market index history
pub async fn get_market(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceSeries>, ApiError> {
    let snapshot = state.snapshot()?;
    snapshot
        .get_market_index_series(&symbol)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No market data for '{}'", symbol)))
}

/// Response for market index listing
#[derive(Debug, Serialize)]
pub struct MarketIndexesResponse {
    pub symbols: Vec<String>,
    pub default_symbol: &'static str,
}

/// GET /market - Market indexes with a price history
pub async fn list_market_indexes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MarketIndexesResponse>, ApiError> {
    let snapshot = state.snapshot()?;
    Ok(Json(MarketIndexesResponse {
        symbols: snapshot
            .market_symbols()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        default_symbol: DEFAULT_MARKET_INDEX,
    }))
}

/// Snapshot entry dropped at load time
#[derive(Debug, Serialize)]
pub struct IssueInfo {
    pub section: Section,
    pub key: Option<String>,
    pub message: String,
}

/// GET /issues - Malformed snapshot entries dropped at load time
pub async fn list_issues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IssueInfo>>, ApiError> {
    let issues = state
        .snapshot()?
        .issues()
        .iter()
        .map(|issue| IssueInfo {
            section: issue.section,
            key: issue.key.clone(),
            message: issue.error.to_string(),
        })
        .collect();
    Ok(Json(issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Action;

    const SNAPSHOT: &str = r#"{
        "predictions": [
            {"Ticker": "AAPL", "Date": "2024-06-03", "Adj Close": 194.0, "Action": "BUY", "Down": 0.2, "Flat": 0.3, "Up": 0.5}
        ],
        "backtest_results": {"AAPL": {"accuracy": 0.54, "f1_macro": 0.41, "log_loss": 1.02, "n_folds": 5}},
        "economic_data": {"Unemployment_Rate": 3.9, "Interest_Rate": 5.33, "Inflation_YoY": 3.3},
        "market_data": {"^GSPC": {"dates": ["2024-05-31", "2024-06-03"], "prices": [5277.5, 5283.4]}},
        "stock_data": [
            {"Ticker": "AAPL", "Date": "2024-05-30", "Adj Close": 190.0},
            {"Ticker": "AAPL", "Date": "2024-05-31", "Adj Close": 192.0},
            {"Ticker": "AAPL", "Date": "2024-06-03", "Adj Close": 194.0},
            {"Ticker": "MSFT", "Date": "2024-06-03", "Adj Close": 415.1}
        ]
    }"#;

    fn loaded() -> State<Arc<AppState>> {
        let snapshot = Snapshot::from_json_str(SNAPSHOT).unwrap();
        State(Arc::new(AppState::new(snapshot)))
    }

    fn unavailable() -> State<Arc<AppState>> {
        State(Arc::new(AppState::unavailable()))
    }

    fn path(s: &str) -> Path<String> {
        Path(s.to_string())
    }

    #[tokio::test]
    async fn test_health_reports_data_availability() {
        assert_eq!(health_check(loaded()).await.0["data_available"], true);
        assert_eq!(health_check(unavailable()).await.0["data_available"], false);
    }

    #[tokio::test]
    async fn test_data_endpoints_without_snapshot() {
        let err = list_tickers(unavailable()).await.unwrap_err();
        assert_eq!(err, ApiError::NoDataAvailable);

        let err = get_dashboard(unavailable(), path("AAPL"), Query(PeriodParams::default()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NoDataAvailable);
    }

    #[tokio::test]
    async fn test_list_tickers() {
        let response = list_tickers(loaded()).await.unwrap().0;
        assert_eq!(response.tickers, vec!["AAPL".to_string()]);
        assert_eq!(response.periods.len(), 5);
        assert_eq!(response.default_period, WindowPreset::Max);
        assert_eq!(response.issues, 0);
    }

    #[tokio::test]
    async fn test_dashboard_for_known_ticker() {
        let params = PeriodParams {
            period: Some("15d".to_string()),
        };
        let dashboard = get_dashboard(loaded(), path("AAPL"), Query(params))
            .await
            .unwrap()
            .0;
        assert_eq!(dashboard.action, Action::Buy);
        assert_eq!(dashboard.period, WindowPreset::FifteenDays);
        assert_eq!(dashboard.window.observations.len(), 3);
        assert_eq!(dashboard.backtest.unwrap().n_folds, Some(5));
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unknown_period() {
        let params = PeriodParams {
            period: Some("2w".to_string()),
        };
        let err = get_dashboard(loaded(), path("AAPL"), Query(params))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_dashboard_for_ticker_without_prediction() {
        let err = get_dashboard(loaded(), path("MSFT"), Query(PeriodParams::default()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::TickerNotFound("MSFT".to_string()));
    }

    #[tokio::test]
    async fn test_window_with_explicit_dates() {
        let params = WindowParams {
            period: None,
            start: Some("2024-05-31".to_string()),
            end: Some("2024-06-03".to_string()),
        };
        let window = get_window(loaded(), path("AAPL"), Query(params)).await.unwrap().0;
        assert_eq!(window.observations.len(), 2);
        let change = window.percent_change.unwrap();
        assert!((change - (194.0 / 192.0 - 1.0) * 100.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_window_inverted_range_is_empty() {
        let params = WindowParams {
            period: None,
            start: Some("2024-06-03".to_string()),
            end: Some("2024-05-31".to_string()),
        };
        let window = get_window(loaded(), path("AAPL"), Query(params)).await.unwrap().0;
        assert!(window.observations.is_empty());
        assert_eq!(window.percent_change, None);
    }

    #[tokio::test]
    async fn test_window_for_unknown_ticker_with_dates_is_empty() {
        let params = WindowParams {
            period: None,
            start: Some("2024-05-31".to_string()),
            end: Some("2024-06-03".to_string()),
        };
        let window = get_window(loaded(), path("TSLA"), Query(params)).await.unwrap().0;
        assert!(window.observations.is_empty());
    }

    #[tokio::test]
    async fn test_window_preset_uses_latest_observation_without_prediction() {
        let params = WindowParams {
            period: Some("1d".to_string()),
            ..Default::default()
        };
        let window = get_window(loaded(), path("MSFT"), Query(params)).await.unwrap().0;
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(window.percent_change, Some(0.0));
    }

    #[tokio::test]
    async fn test_window_requires_both_dates() {
        let params = WindowParams {
            period: None,
            start: Some("2024-05-31".to_string()),
            end: None,
        };
        let err = get_window(loaded(), path("AAPL"), Query(params)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_stats_default_and_explicit_date() {
        let stats = get_stats(loaded(), path("AAPL"), Query(StatsParams::default()))
            .await
            .unwrap()
            .0;
        assert_eq!(stats.current_price, Some(194.0));
        assert_eq!(stats.week52_high, Some(194.0));
        assert_eq!(stats.week52_low, Some(190.0));

        let params = StatsParams {
            date: Some("2024-05-31".to_string()),
        };
        let stats = get_stats(loaded(), path("AAPL"), Query(params)).await.unwrap().0;
        assert_eq!(stats.current_price, Some(192.0));
    }

    #[tokio::test]
    async fn test_stats_rejects_bad_date() {
        let params = StatsParams {
            date: Some("June 3rd".to_string()),
        };
        let err = get_stats(loaded(), path("AAPL"), Query(params)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate(_)));
    }

    #[tokio::test]
    async fn test_prediction_and_backtest_lookups() {
        let prediction = get_prediction(loaded(), path("AAPL")).await.unwrap().0;
        assert_eq!(prediction.probabilities.up, 0.5);

        let err = get_backtest(loaded(), path("MSFT")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_economic_prefers_year_over_year_inflation() {
        let response = get_economic(loaded()).await.unwrap().0;
        assert_eq!(response.inflation, Some(Inflation::YearOverYear(3.3)));
        assert_eq!(response.indicators["Interest_Rate"], 5.33);
    }

    #[tokio::test]
    async fn test_market_index() {
        let series = get_market(loaded(), path("^GSPC")).await.unwrap().0;
        assert_eq!(series.len(), 2);
        assert!(get_market(loaded(), path("^DJI")).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_ticker_preset_window_is_empty() {
        let params = WindowParams {
            period: Some("15d".to_string()),
            ..Default::default()
        };
        let window = get_window(loaded(), path("TSLA"), Query(params)).await.unwrap().0;
        assert!(window.observations.is_empty());
        assert_eq!(window.percent_change, None);

        let stats = get_stats(loaded(), path("TSLA"), Query(StatsParams::default()))
            .await
            .unwrap()
            .0;
        assert_eq!(stats.current_price, None);
    }

    #[tokio::test]
    async fn test_list_market_indexes() {
        let response = list_market_indexes(loaded()).await.unwrap().0;
        assert_eq!(response.symbols, vec!["^GSPC".to_string()]);
        assert_eq!(response.default_symbol, "^GSPC");

        let err = list_market_indexes(unavailable()).await.unwrap_err();
        assert_eq!(err, ApiError::NoDataAvailable);
    }

    #[tokio::test]
    async fn test_list_issues() {
        assert!(list_issues(loaded()).await.unwrap().0.is_empty());

        let snapshot = Snapshot::from_json_str(
            r#"{"stock_data": [{"Ticker": "AAPL", "Date": "2024-06-03", "Adj Close": -5.0}]}"#,
        )
        .unwrap();
        let state = State(Arc::new(AppState::new(snapshot)));
        let issues = list_issues(state).await.unwrap().0;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].section, Section::StockData);
        assert_eq!(issues[0].key.as_deref(), Some("AAPL"));
        let body = serde_json::to_value(&issues[0]).unwrap();
        assert_eq!(body["section"], "stock_data");
    }
}
