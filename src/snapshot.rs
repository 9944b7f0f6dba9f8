//! Snapshot of precomputed stock, market and economic data.
//!
//! The snapshot is a single JSON document produced by an external batch
//! job. It is parsed once, validated row by row, and then served read-only
//! through the [`DataProvider`] trait. Malformed rows are dropped, logged and
//! recorded in [`Snapshot::issues`]; only an unreadable or unparsable
//! document fails the load.

use crate::prediction::{Action, BacktestSummary, PredictionRecord, RecordError};
use crate::symbol::Symbol;
use crate::time_series::{date_from_epoch_millis, is_valid_price, parse_date, PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Read access to snapshot data by exact key.
///
/// Unknown keys yield `None`; lookups never fail. The trait lets the
/// analytics engines run against the loaded [`Snapshot`] or against a
/// synthetic provider in tests.
pub trait DataProvider {
    /// Full price history for a stock ticker.
    fn get_series(&self, ticker: &str) -> Option<&PriceSeries>;

    /// Latest model prediction for a ticker.
    fn get_prediction(&self, ticker: &str) -> Option<&PredictionRecord>;

    /// Backtest metrics for a ticker.
    fn get_backtest(&self, ticker: &str) -> Option<&BacktestSummary>;

    /// Price history for a market index such as `^GSPC`.
    fn get_market_index_series(&self, symbol: &str) -> Option<&PriceSeries>;

    /// Named economic indicators.
    fn get_economic_indicators(&self) -> &EconomicIndicators;
}

pub const UNEMPLOYMENT_RATE: &str = "Unemployment_Rate";
pub const INTEREST_RATE: &str = "Interest_Rate";
pub const INFLATION_YOY: &str = "Inflation_YoY";
pub const INFLATION_RATE: &str = "Inflation_Rate";

/// Named economic scalars, e.g. unemployment or interest rate.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct EconomicIndicators(BTreeMap<String, f64>);

/// Inflation reading, preferring the year-over-year rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Inflation {
    /// Year-over-year change, in percent
    YearOverYear(f64),
    /// Raw price index level, used when no YoY figure exists
    Index(f64),
}

impl EconomicIndicators {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        EconomicIndicators(values)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn unemployment_rate(&self) -> Option<f64> {
        self.get(UNEMPLOYMENT_RATE)
    }

    pub fn interest_rate(&self) -> Option<f64> {
        self.get(INTEREST_RATE)
    }

    pub fn inflation(&self) -> Option<Inflation> {
        self.get(INFLATION_YOY)
            .map(Inflation::YearOverYear)
            .or_else(|| self.get(INFLATION_RATE).map(Inflation::Index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Top-level section of the snapshot document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Predictions,
    BacktestResults,
    EconomicData,
    MarketData,
    StockData,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Predictions => "predictions",
            Section::BacktestResults => "backtest_results",
            Section::EconomicData => "economic_data",
            Section::MarketData => "market_data",
            Section::StockData => "stock_data",
        }
    }
}

/// A malformed snapshot entry that was dropped during loading.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIssue {
    pub section: Section,
    /// Ticker, index symbol or indicator name, when known
    pub key: Option<String>,
    pub error: RecordError,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]: {}", self.section.as_str(), key, self.error),
            None => write!(f, "{}: {}", self.section.as_str(), self.error),
        }
    }
}

/// Failure to load the snapshot document at all.
#[derive(Debug)]
pub enum SnapshotError {
    /// File could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// Document is not valid snapshot JSON
    Parse(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io { path, source } => {
                write!(f, "Cannot read snapshot {}: {}", path.display(), source)
            }
            SnapshotError::Parse(err) => write!(f, "Cannot parse snapshot: {}", err),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io { source, .. } => Some(source),
            SnapshotError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Parse(err)
    }
}

/// Validated, immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    predictions: BTreeMap<Symbol, PredictionRecord>,
    backtests: HashMap<Symbol, BacktestSummary>,
    economic: EconomicIndicators,
    market: HashMap<Symbol, PriceSeries>,
    stocks: HashMap<Symbol, PriceSeries>,
    issues: Vec<RecordIssue>,
}

impl Snapshot {
    /// Reads and validates the snapshot file at `path`.
    ///
    /// # Errors
    /// Returns [`SnapshotError`] if the file cannot be read or parsed.
    /// Individual malformed rows do not fail the load.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json_str(&text)?;
        log::info!(
            "Loaded snapshot {}: {} predictions, {} stock series, {} market series, {} issues",
            path.display(),
            snapshot.predictions.len(),
            snapshot.stocks.len(),
            snapshot.market.len(),
            snapshot.issues.len()
        );
        Ok(snapshot)
    }

    /// Parses and validates a snapshot document.
    ///
    /// The non-finite tokens `NaN`, `Infinity` and `-Infinity` written by
    /// Python's `json` module are read as `null`, so the affected value is
    /// absent instead of failing the whole document.
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(&null_non_finite(json))?;
        Ok(Self::from_raw(raw))
    }

    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Tickers with a prediction, sorted and de-duplicated.
    pub fn tickers(&self) -> Vec<&Symbol> {
        self.predictions.keys().collect()
    }

    /// Symbols with a market index history.
    pub fn market_symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<_> = self.market.keys().collect();
        symbols.sort();
        symbols
    }

    /// Earliest stock observation across every ticker.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.stocks
            .values()
            .filter_map(|series| series.first().map(|p| p.date))
            .min()
    }

    /// Malformed entries dropped while loading.
    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    fn from_raw(raw: RawSnapshot) -> Self {
        let mut snapshot = Snapshot::default();

        for row in raw.predictions {
            snapshot.load_prediction(row);
        }

        for (key, value) in raw.backtest_results {
            let Some(symbol) = snapshot.symbol_or_flag(Section::BacktestResults, &key) else {
                continue;
            };
            match serde_json::from_value::<BacktestSummary>(value) {
                Ok(summary) => {
                    snapshot.backtests.insert(symbol, summary);
                }
                Err(err) => snapshot.flag(
                    Section::BacktestResults,
                    Some(key),
                    RecordError::Malformed(err.to_string()),
                ),
            }
        }

        let mut economic = BTreeMap::new();
        for (name, value) in raw.economic_data {
            match value {
                Value::Null => {}
                Value::Number(number) => match number.as_f64() {
                    Some(v) => {
                        economic.insert(name, v);
                    }
                    None => snapshot.flag(
                        Section::EconomicData,
                        Some(name),
                        RecordError::Malformed(number.to_string()),
                    ),
                },
                other => snapshot.flag(
                    Section::EconomicData,
                    Some(name),
                    RecordError::Malformed(format!("expected a number, found {}", other)),
                ),
            }
        }
        snapshot.economic = EconomicIndicators::new(economic);

        for (key, series) in raw.market_data {
            snapshot.load_market_series(key, series);
        }

        let mut stock_rows: BTreeMap<Symbol, SeriesAccumulator> = BTreeMap::new();
        for row in raw.stock_data {
            let key = row.ticker.clone();
            match parse_stock_row(row) {
                Ok((symbol, date, price)) => {
                    if let Err(err) = stock_rows.entry(symbol).or_default().push(date, price) {
                        snapshot.flag(Section::StockData, key, err);
                    }
                }
                Err(err) => snapshot.flag(Section::StockData, key, err),
            }
        }
        for (symbol, rows) in stock_rows {
            match rows.finish(symbol.clone()) {
                Ok(series) => {
                    snapshot.stocks.insert(symbol, series);
                }
                Err(err) => snapshot.flag(Section::StockData, Some(symbol.to_string()), err),
            }
        }

        snapshot
    }

    fn load_prediction(&mut self, row: RawPredictionRow) {
        let key = row.ticker.clone();
        let record = match parse_prediction_row(row) {
            Ok(record) => record,
            Err(err) => return self.flag(Section::Predictions, key, err),
        };

        if self.predictions.contains_key(&record.ticker) {
            // First row wins, later rows for the same ticker are reported
            self.flag(
                Section::Predictions,
                key,
                RecordError::Malformed("duplicate prediction for ticker".to_string()),
            );
            return;
        }
        self.predictions.insert(record.ticker.clone(), record);
    }

    fn load_market_series(&mut self, key: String, raw: RawMarketSeries) {
        let Some(symbol) = self.symbol_or_flag(Section::MarketData, &key) else {
            return;
        };

        if raw.dates.len() != raw.prices.len() {
            self.flag(
                Section::MarketData,
                Some(key.clone()),
                RecordError::MismatchedLengths {
                    dates: raw.dates.len(),
                    prices: raw.prices.len(),
                },
            );
        }

        let mut rows = SeriesAccumulator::default();
        for (date, price) in raw.dates.iter().zip(raw.prices) {
            let parsed = date
                .to_date()
                .and_then(|date| Ok((date, price.ok_or(RecordError::MissingField("prices"))?)))
                .and_then(|(date, price)| rows.push(date, price));
            if let Err(err) = parsed {
                self.flag(Section::MarketData, Some(key.clone()), err);
            }
        }

        match rows.finish(symbol.clone()) {
            Ok(series) => {
                self.market.insert(symbol, series);
            }
            Err(err) => self.flag(Section::MarketData, Some(key), err),
        }
    }

    fn symbol_or_flag(&mut self, section: Section, key: &str) -> Option<Symbol> {
        match Symbol::new(key) {
            Ok(symbol) => Some(symbol),
            Err(err) => {
                self.flag(section, Some(key.to_string()), err.into());
                None
            }
        }
    }

    fn flag(&mut self, section: Section, key: Option<String>, error: RecordError) {
        let issue = RecordIssue { section, key, error };
        log::warn!("Dropping malformed snapshot entry: {}", issue);
        self.issues.push(issue);
    }
}

impl DataProvider for Snapshot {
    fn get_series(&self, ticker: &str) -> Option<&PriceSeries> {
        self.stocks.get(ticker)
    }

    fn get_prediction(&self, ticker: &str) -> Option<&PredictionRecord> {
        self.predictions.get(ticker)
    }

    fn get_backtest(&self, ticker: &str) -> Option<&BacktestSummary> {
        self.backtests.get(ticker)
    }

    fn get_market_index_series(&self, symbol: &str) -> Option<&PriceSeries> {
        self.market.get(symbol)
    }

    fn get_economic_indicators(&self) -> &EconomicIndicators {
        &self.economic
    }
}

/// Assembles a snapshot from already-validated parts.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    pub fn series(mut self, series: PriceSeries) -> Self {
        self.snapshot.stocks.insert(series.symbol().clone(), series);
        self
    }

    pub fn prediction(mut self, record: PredictionRecord) -> Self {
        self.snapshot.predictions.insert(record.ticker.clone(), record);
        self
    }

    pub fn backtest(mut self, ticker: Symbol, summary: BacktestSummary) -> Self {
        self.snapshot.backtests.insert(ticker, summary);
        self
    }

    pub fn market_series(mut self, series: PriceSeries) -> Self {
        self.snapshot.market.insert(series.symbol().clone(), series);
        self
    }

    pub fn economic_indicators(mut self, indicators: EconomicIndicators) -> Self {
        self.snapshot.economic = indicators;
        self
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}

/// Collects observations for one symbol, rejecting invalid prices and
/// repeated dates as they arrive.
#[derive(Default)]
struct SeriesAccumulator {
    points: Vec<PricePoint>,
    seen: HashSet<NaiveDate>,
}

impl SeriesAccumulator {
    fn push(&mut self, date: NaiveDate, price: f64) -> Result<(), RecordError> {
        if !is_valid_price(price) {
            return Err(RecordError::InvalidPrice(price));
        }
        if !self.seen.insert(date) {
            return Err(RecordError::DuplicateDate(date));
        }
        self.points.push(PricePoint::new(date, price));
        Ok(())
    }

    fn finish(self, symbol: Symbol) -> Result<PriceSeries, RecordError> {
        Ok(PriceSeries::new(symbol, self.points)?)
    }
}

// Wire format

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSnapshot {
    predictions: Vec<RawPredictionRow>,
    backtest_results: HashMap<String, Value>,
    economic_data: HashMap<String, Value>,
    market_data: HashMap<String, RawMarketSeries>,
    stock_data: Vec<RawStockRow>,
}

#[derive(Debug, Deserialize)]
struct RawPredictionRow {
    #[serde(rename = "Ticker")]
    ticker: Option<String>,
    #[serde(rename = "Date")]
    date: Option<RawDate>,
    #[serde(rename = "Adj Close")]
    adj_close: Option<f64>,
    #[serde(rename = "Action")]
    action: Option<String>,
    #[serde(rename = "Down")]
    down: Option<f64>,
    #[serde(rename = "Flat")]
    flat: Option<f64>,
    #[serde(rename = "Up")]
    up: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStockRow {
    #[serde(rename = "Ticker")]
    ticker: Option<String>,
    #[serde(rename = "Date")]
    date: Option<RawDate>,
    #[serde(rename = "Adj Close")]
    adj_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMarketSeries {
    dates: Vec<RawDate>,
    prices: Vec<Option<f64>>,
}

/// Dates arrive as text or as pandas epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    EpochMillis(i64),
}

impl RawDate {
    fn to_date(&self) -> Result<NaiveDate, RecordError> {
        match self {
            RawDate::Text(text) => {
                parse_date(text).map_err(|_| RecordError::InvalidDate(text.clone()))
            }
            RawDate::EpochMillis(millis) => date_from_epoch_millis(*millis)
                .ok_or_else(|| RecordError::InvalidDate(millis.to_string())),
        }
    }
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Rewrites bare non-finite number tokens to `null`, leaving string
/// literals untouched.
fn null_non_finite(json: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| json.contains(token)) {
        return Cow::Borrowed(json);
    }

    let mut out = String::with_capacity(json.len());
    let mut rest = json;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField(field))
}

fn parse_prediction_row(row: RawPredictionRow) -> Result<PredictionRecord, RecordError> {
    let ticker = Symbol::new(required(row.ticker, "Ticker")?)?;
    let as_of = required(row.date, "Date")?.to_date()?;
    let action: Action = required(row.action, "Action")?.parse()?;
    PredictionRecord::new(
        ticker,
        as_of,
        required(row.adj_close, "Adj Close")?,
        action,
        required(row.down, "Down")?,
        required(row.flat, "Flat")?,
        required(row.up, "Up")?,
    )
}

fn parse_stock_row(row: RawStockRow) -> Result<(Symbol, NaiveDate, f64), RecordError> {
    let symbol = Symbol::new(required(row.ticker, "Ticker")?)?;
    let date = required(row.date, "Date")?.to_date()?;
    let price = required(row.adj_close, "Adj Close")?;
    Ok((symbol, date, price))
}
