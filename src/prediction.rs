use crate::symbol::{Symbol, SymbolError};
use crate::time_series::{is_valid_price, SeriesError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance allowed when checking that the three probabilities sum to one.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Action label emitted by the upstream prediction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Short,
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Short => "SHORT",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SHORT" => Ok(Action::Short),
            "HOLD" => Ok(Action::Hold),
            _ => Err(RecordError::UnknownAction(s.to_string())),
        }
    }
}

/// Direction of the next price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Down,
    Flat,
    Up,
}

/// Predicted probabilities of each movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub down: f64,
    pub flat: f64,
    pub up: f64,
}

impl Probabilities {
    /// Validates and builds a probability triple.
    ///
    /// # Errors
    /// Returns an error if any value lies outside `[0, 1]` or the three do
    /// not sum to one within [`PROBABILITY_SUM_TOLERANCE`].
    pub fn new(down: f64, flat: f64, up: f64) -> Result<Self, RecordError> {
        for (name, value) in [("down", down), ("flat", flat), ("up", up)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RecordError::ProbabilityOutOfRange { name, value });
            }
        }

        let sum = down + flat + up;
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(RecordError::ProbabilitySum(sum));
        }

        Ok(Probabilities { down, flat, up })
    }

    /// Movement with the highest probability. Ties resolve toward `Flat`,
    /// then `Up`.
    pub fn dominant(&self) -> Movement {
        let mut best = (Movement::Flat, self.flat);
        for candidate in [(Movement::Up, self.up), (Movement::Down, self.down)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

/// Prediction for one ticker as produced by the upstream model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub ticker: Symbol,
    pub as_of: NaiveDate,
    pub price: f64,
    pub action: Action,
    pub probabilities: Probabilities,
}

impl PredictionRecord {
    /// Validates and builds a prediction record.
    ///
    /// # Errors
    /// Returns an error for a non-positive or non-finite price or for an
    /// invalid probability triple.
    pub fn new(
        ticker: Symbol,
        as_of: NaiveDate,
        price: f64,
        action: Action,
        down: f64,
        flat: f64,
        up: f64,
    ) -> Result<Self, RecordError> {
        if !is_valid_price(price) {
            return Err(RecordError::InvalidPrice(price));
        }
        let probabilities = Probabilities::new(down, flat, up)?;
        Ok(PredictionRecord {
            ticker,
            as_of,
            price,
            action,
            probabilities,
        })
    }
}

/// Cross-validated backtest metrics for one ticker, passed through as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestSummary {
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub f1_macro: Option<f64>,
    #[serde(default)]
    pub log_loss: Option<f64>,
    #[serde(default)]
    pub n_folds: Option<u32>,
}

/// A snapshot row that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Probabilities do not sum to one
    ProbabilitySum(f64),
    /// A probability lies outside `[0, 1]`
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    /// Action label is not BUY, SHORT or HOLD
    UnknownAction(String),
    /// Price is zero, negative or non-finite
    InvalidPrice(f64),
    /// A required field is missing
    MissingField(&'static str),
    /// Date could not be interpreted
    InvalidDate(String),
    /// Symbol failed validation
    InvalidSymbol(String),
    /// A second observation for a date already seen
    DuplicateDate(NaiveDate),
    /// Parallel date and price lists differ in length
    MismatchedLengths { dates: usize, prices: usize },
    /// Nested object could not be decoded
    Malformed(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::ProbabilitySum(sum) => {
                write!(f, "Probabilities sum to {} instead of 1", sum)
            }
            RecordError::ProbabilityOutOfRange { name, value } => {
                write!(f, "Probability '{}' = {} is outside [0, 1]", name, value)
            }
            RecordError::UnknownAction(action) => write!(f, "Unknown action '{}'", action),
            RecordError::InvalidPrice(price) => write!(f, "Invalid price {}", price),
            RecordError::MissingField(field) => write!(f, "Missing field '{}'", field),
            RecordError::InvalidDate(date) => write!(f, "Invalid date '{}'", date),
            RecordError::InvalidSymbol(msg) => write!(f, "Invalid symbol: {}", msg),
            RecordError::DuplicateDate(date) => write!(f, "Duplicate observation for {}", date),
            RecordError::MismatchedLengths { dates, prices } => write!(
                f,
                "{} dates but {} prices; extra entries ignored",
                dates, prices
            ),
            RecordError::Malformed(msg) => write!(f, "Malformed record: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<SeriesError> for RecordError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::DuplicateDate(date) => RecordError::DuplicateDate(date),
            SeriesError::InvalidPrice { price, .. } => RecordError::InvalidPrice(price),
        }
    }
}

impl From<SymbolError> for RecordError {
    fn from(err: SymbolError) -> Self {
        RecordError::InvalidSymbol(err.to_string())
    }
}
