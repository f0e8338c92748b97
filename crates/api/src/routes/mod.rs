pub mod health;
pub mod trigger;

use axum::Router;

use crate::state::AppState;

/// Build the full route tree.
///
/// ```text
/// /healthz      liveness
/// /             index, compatibility submit
/// /run          trigger the analyzer job
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(trigger::router())
}
