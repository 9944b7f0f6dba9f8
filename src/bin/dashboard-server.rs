//! Stock Dashboard API Server Binary
//!
//! Run with: `cargo run --bin dashboard-server`

use stock_dashboard::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Note: Tracing is initialized in run_server()
    // Set RUST_LOG environment variable to control log level:
    //   RUST_LOG=debug cargo run --bin dashboard-server
    //   RUST_LOG=stock_dashboard::analytics=debug cargo run --bin dashboard-server

    // HOST, PORT and SNAPSHOT_PATH override the defaults
    let config = ServerConfig::from_env();

    println!("Starting Stock Dashboard API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Snapshot: {}", config.snapshot_path.display());
    println!();
    println!(
        "Server will be available at: http://{}:{}",
        config.host, config.port
    );
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                       - Health check");
    println!("  GET  /tickers                      - Tickers with predictions");
    println!("  GET  /tickers/:ticker/dashboard    - Full dashboard (?period=)");
    println!("  GET  /tickers/:ticker/window       - Price window (?period= or ?start=&end=)");
    println!("  GET  /tickers/:ticker/stats        - Risk statistics (?date=)");
    println!("  GET  /tickers/:ticker/prediction   - Latest prediction");
    println!("  GET  /tickers/:ticker/backtest     - Backtest summary");
    println!("  GET  /economic                     - Economic indicators");
    println!("  GET  /market                       - Market indexes");
    println!("  GET  /market/:symbol               - Market index series");
    println!("  GET  /issues                       - Entries dropped at load");
    println!();

    run_server(config).await?;

    Ok(())
}
