//! REST API server exposing the dashboard views as JSON

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use crate::snapshot::Snapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path to the snapshot document (default: "cached_results.json")
    pub snapshot_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            snapshot_path: PathBuf::from("cached_results.json"),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(host: impl Into<String>, port: u16, snapshot_path: impl Into<PathBuf>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Reads `HOST`, `PORT` and `SNAPSHOT_PATH`, falling back to the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|port| port.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
        }
    }
}

/// Loads the snapshot once for the lifetime of the server.
///
/// A failed load is not retried; the server then answers every data request
/// with a "no data available" error.
pub fn load_state(snapshot_path: &Path) -> AppState {
    match Snapshot::from_path(snapshot_path) {
        Ok(snapshot) => {
            for issue in snapshot.issues() {
                tracing::debug!(%issue, "snapshot entry dropped");
            }
            AppState::new(snapshot)
        }
        Err(err) => {
            tracing::error!("{}", err);
            AppState::unavailable()
        }
    }
}

/// Runs the API server
///
/// # Arguments
/// * `config` - Server configuration
///
/// # Returns
/// Returns an error if the server fails to bind or encounters a fatal error
///
/// # Example
/// ```rust,no_run
/// use stock_dashboard::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::from_env()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let snapshot_path = config.snapshot_path.clone();
    let state = tokio::task::spawn_blocking(move || load_state(&snapshot_path)).await?;

    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
