use axum::{routing::get, Router};

use crate::state::AppState;

/// GET /healthz -- liveness only; does not touch the execution service.
async fn healthz() -> &'static str {
    "ok"
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}
