use std::sync::Arc;

use golfrun_cloud::JobRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, including the target job.
    pub config: Arc<ServerConfig>,
    /// Job runner built once at startup and shared by every request.
    pub runner: Arc<dyn JobRunner>,
}
