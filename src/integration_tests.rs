// Integration tests for end-to-end workflows: snapshot document -> analytics -> view models

#[cfg(test)]
mod integration_tests {
    use crate::analytics::risk::{compute_stats, RiskStatsEngine};
    use crate::analytics::windows::{window, PeriodWindower, WindowPreset};
    use crate::dashboard::{build_dashboard, market_overview, DEFAULT_MARKET_INDEX};
    use crate::prediction::{Action, Movement};
    use crate::snapshot::{DataProvider, Inflation, Section, Snapshot};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SNAPSHOT: &str = r#"{
        "predictions": [
            {"Ticker": "AAPL", "Date": "2024-01-01", "Adj Close": 90.0,
             "Action": "SHORT", "Down": 0.6, "Flat": 0.3, "Up": 0.1},
            {"Ticker": "MSFT", "Date": "2024-01-03", "Adj Close": 375.0,
             "Action": "BUY", "Down": 0.2, "Flat": 0.3, "Up": 0.5},
            {"Ticker": "TSLA", "Date": "2024-01-03", "Adj Close": 240.0,
             "Action": "HOLD", "Down": 0.5, "Flat": 0.5, "Up": 0.2}
        ],
        "backtest_results": {
            "AAPL": {"accuracy": 0.54, "f1_macro": 0.41, "log_loss": 1.02, "n_folds": 5}
        },
        "economic_data": {
            "Unemployment_Rate": 3.7,
            "Interest_Rate": 5.33,
            "Inflation_Rate": 309.7
        },
        "market_data": {
            "^GSPC": {
                "dates": ["2023-12-29", "2024-01-02", "2024-01-03"],
                "prices": [4769.83, 4742.83, 4704.81]
            }
        },
        "stock_data": [
            {"Ticker": "AAPL", "Date": "2023-06-01", "Adj Close": 120.0},
            {"Ticker": "AAPL", "Date": "2023-01-01", "Adj Close": 100.0},
            {"Ticker": "AAPL", "Date": "2024-01-01", "Adj Close": 90.0},
            {"Ticker": "MSFT", "Date": "2024-01-02", "Adj Close": 370.0},
            {"Ticker": "MSFT", "Date": "2024-01-03", "Adj Close": 375.0},
            {"Ticker": "MSFT", "Date": "2024-01-04", "Adj Close": -1.0}
        ]
    }"#;

    fn snapshot() -> Snapshot {
        Snapshot::from_json_str(SNAPSHOT).unwrap()
    }

    /// Test end-to-end workflow: load snapshot -> select ticker -> build dashboard
    #[test]
    fn test_dashboard_end_to_end_workflow() {
        let snapshot = snapshot();

        let tickers: Vec<&str> = snapshot.tickers().iter().map(|s| s.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);

        let dashboard = build_dashboard(&snapshot, "AAPL", WindowPreset::Max).unwrap();
        assert_eq!(dashboard.as_of, date(2024, 1, 1));
        assert_eq!(dashboard.action, Action::Short);
        assert_eq!(dashboard.dominant_movement, Movement::Down);

        // Max window covers the whole (sorted) history
        assert_eq!(dashboard.window.observations.len(), 3);
        assert_eq!(dashboard.window.start, date(2023, 1, 1));
        let change = dashboard.window.percent_change.unwrap();
        assert!((change - (-10.0)).abs() < 1e-9);

        let stats = &dashboard.stats;
        assert_eq!(stats.current_price, Some(90.0));
        assert_eq!(stats.week52_high, Some(120.0));
        assert_eq!(stats.week52_low, Some(90.0));
        assert!((stats.distance_from_high.unwrap() - (-25.0)).abs() < 1e-9);
        assert_eq!(stats.distance_from_low, Some(0.0));

        let backtest = dashboard.backtest.unwrap();
        assert_eq!(backtest.n_folds, Some(5));
    }

    /// Malformed rows are reported but never abort the load
    #[test]
    fn test_malformed_rows_are_isolated() {
        let snapshot = snapshot();

        // TSLA probabilities sum to 1.2
        assert!(snapshot.get_prediction("TSLA").is_none());
        assert!(snapshot
            .issues()
            .iter()
            .any(|issue| issue.section == Section::Predictions
                && issue.key.as_deref() == Some("TSLA")));

        // The negative MSFT price is dropped, the rest of the series survives
        let msft = snapshot.get_series("MSFT").unwrap();
        assert_eq!(msft.len(), 2);
        assert!(snapshot
            .issues()
            .iter()
            .any(|issue| issue.section == Section::StockData));
    }

    #[test]
    fn test_windower_and_engine_share_snapshot_handle() {
        let snapshot = snapshot();
        let windower = PeriodWindower::new(&snapshot);
        let engine = RiskStatsEngine::new(&snapshot);

        let one_day = windower.preset_window("MSFT", WindowPreset::OneDay, date(2024, 1, 3));
        assert_eq!(one_day.observations.len(), 2);
        let expected = (375.0 / 370.0 - 1.0) * 100.0;
        assert!((one_day.percent_change.unwrap() - expected).abs() < 1e-9);

        let stats = engine.compute_stats("MSFT", date(2024, 1, 3));
        assert_eq!(stats.current_price, Some(375.0));
        // One return only
        assert!(stats.annualized_volatility.is_none());

        assert!(windower
            .window("NOPE", date(2024, 1, 1), date(2024, 1, 3))
            .is_empty());
        assert!(engine.compute_stats("NOPE", date(2024, 1, 3)).current_price.is_none());
    }

    #[test]
    fn test_market_overview_uses_inflation_fallback() {
        let snapshot = snapshot();
        let overview = market_overview(&snapshot, DEFAULT_MARKET_INDEX);

        assert_eq!(overview.economic.unemployment_rate(), Some(3.7));
        assert_eq!(overview.economic.inflation(), Some(Inflation::Index(309.7)));
        let index = overview.index.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.last().unwrap().date, date(2024, 1, 3));
    }

    #[test]
    fn test_window_properties_over_snapshot_series() {
        let snapshot = snapshot();
        let series = snapshot.get_series("AAPL").unwrap();

        let full = window(series, date(2022, 1, 1), date(2025, 1, 1));
        assert!(full
            .observations
            .windows(2)
            .all(|pair| pair[0].date <= pair[1].date));

        let single = window(series, date(2023, 6, 1), date(2023, 6, 1));
        assert_eq!(single.percent_change, Some(0.0));

        let inverted = window(series, date(2024, 1, 1), date(2023, 1, 1));
        assert!(inverted.observations.is_empty());
        assert!(inverted.percent_change.is_none());
    }

    #[test]
    fn test_stats_are_deterministic_for_every_reference_date() {
        let snapshot = snapshot();
        let series = snapshot.get_series("AAPL").unwrap();

        for reference in [date(2022, 12, 31), date(2023, 3, 1), date(2023, 6, 1), date(2024, 1, 1)] {
            let first = compute_stats(series, reference);
            let second = compute_stats(series, reference);
            assert_eq!(first, second);

            if let (Some(high), Some(low)) = (first.week52_high, first.week52_low) {
                assert!(high >= low);
            }
        }
    }
}
