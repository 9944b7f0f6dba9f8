pub mod symbol;
pub mod time_series;
pub mod analytics;
pub mod prediction;
pub mod snapshot;
pub mod dashboard;
pub mod server;

#[cfg(test)]
mod integration_tests;

pub use symbol::{Symbol, SymbolError};
pub use time_series::{parse_date, DateRange, PricePoint, PriceSeries, SeriesError};
pub use analytics::{
    compute_stats,
    window,
    PeriodWindow,
    PeriodWindower,
    RiskStats,
    RiskStatsEngine,
    UnknownPreset,
    WindowPreset,
};
pub use prediction::{Action, BacktestSummary, Movement, PredictionRecord, Probabilities, RecordError};
pub use snapshot::{
    DataProvider,
    EconomicIndicators,
    Inflation,
    RecordIssue,
    Snapshot,
    SnapshotBuilder,
    SnapshotError,
};
pub use dashboard::{build_dashboard, market_overview, MarketOverview, TickerDashboard, DEFAULT_MARKET_INDEX};
pub use server::{run_server, ServerConfig, AppState, ApiError};
