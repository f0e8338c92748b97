//! Route definitions for the trigger endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::trigger;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// GET    /        -> index
/// POST   /        -> submit (greeting or dispatch)
/// POST   /run     -> run
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trigger::index).post(trigger::submit))
        .route("/run", post(trigger::run))
}
