//! Route definitions for the API server

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // Read-only API, any origin may call it
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Ticker selection and per-ticker views
        .route("/tickers", get(handlers::list_tickers))
        .route("/tickers/:ticker/dashboard", get(handlers::get_dashboard))
        .route("/tickers/:ticker/window", get(handlers::get_window))
        .route("/tickers/:ticker/stats", get(handlers::get_stats))
        .route("/tickers/:ticker/prediction", get(handlers::get_prediction))
        .route("/tickers/:ticker/backtest", get(handlers::get_backtest))
        // Market-wide context
        .route("/economic", get(handlers::get_economic))
        .route("/market", get(handlers::list_market_indexes))
        .route("/market/:symbol", get(handlers::get_market))
        .route("/issues", get(handlers::list_issues))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
