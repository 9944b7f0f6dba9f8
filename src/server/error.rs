//! Error types for the REST API server

use crate::analytics::windows::UnknownPreset;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Snapshot missing or unreadable; nothing can be shown
    NoDataAvailable,
    /// No prediction or price history for the ticker
    TickerNotFound(String),
    /// Other keyed lookup without a match (backtest, market index)
    NotFound(String),
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Date parameter could not be parsed
    InvalidDate(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NoDataAvailable => write!(f, "No data available"),
            ApiError::TickerNotFound(ticker) => write!(f, "Ticker not found: {}", ticker),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoDataAvailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::TickerNotFound(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidParameter(_) | ApiError::InvalidDate(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NoDataAvailable => "NoDataAvailable",
            ApiError::TickerNotFound(_) => "TickerNotFound",
            ApiError::NotFound(_) => "NotFound",
            ApiError::InvalidParameter(_) => "InvalidParameter",
            ApiError::InvalidDate(_) => "InvalidDate",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::NoDataAvailable => {
                "No cached results found. Generate the snapshot and restart the server.".to_string()
            }
            ApiError::TickerNotFound(ticker) => format!("No data available for '{}'", ticker),
            ApiError::NotFound(msg) | ApiError::InvalidParameter(msg) | ApiError::InvalidDate(msg) => {
                msg.clone()
            }
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

// Conversions from other error types

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidDate(format!("Date parse error: {}", err))
    }
}

impl From<UnknownPreset> for ApiError {
    fn from(err: UnknownPreset) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidParameter(format!("JSON error: {}", err))
    }
}
