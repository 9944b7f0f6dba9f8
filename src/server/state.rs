//! Shared application state for the API server

use super::error::ApiError;
use crate::snapshot::Snapshot;
use std::sync::Arc;

/// Shared application state
///
/// The snapshot is immutable after load, so handlers share it without
/// locking. `None` means the load failed and every data endpoint reports
/// that no data is available.
#[derive(Debug, Clone)]
pub struct AppState {
    snapshot: Option<Arc<Snapshot>>,
}

impl AppState {
    /// Creates a state serving `snapshot`
    pub fn new(snapshot: Snapshot) -> Self {
        AppState {
            snapshot: Some(Arc::new(snapshot)),
        }
    }

    /// Creates a state for a failed snapshot load
    pub fn unavailable() -> Self {
        AppState { snapshot: None }
    }

    pub fn has_data(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The loaded snapshot, or [`ApiError::NoDataAvailable`].
    pub fn snapshot(&self) -> Result<&Snapshot, ApiError> {
        self.snapshot.as_deref().ok_or(ApiError::NoDataAvailable)
    }
}
