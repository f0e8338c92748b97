//! Handlers for triggering the analyzer job.
//!
//! `POST /run` is the canonical endpoint: strict `source` validation and a
//! confirmed execution. `POST /` is the compatibility surface; bodies with
//! neither `source` nor `args` get a greeting instead of a dispatch.
//!
//! Bodies are read as raw bytes so that empty or malformed JSON is treated
//! as `{}` rather than rejected by the extractor.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use golfrun_core::job::JobResource;
use golfrun_core::trigger::{parse_body, SourcePolicy, TriggerIntent, TriggerRequest};

use crate::error::{AppError, AppResult};
use crate::response::{GreetingResponse, IndexResponse, TriggerResult, STATUS_ACCEPTED};
use crate::state::AppState;

const INDEX_HINT: &str = r#"POST /run with {"source":"gs://<bucket>/<video>.mp4","view":"fo|dtl","handedness":"right|left"}"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trigger one execution and build the accepted response.
///
/// Exactly one runner call; failures are not retried.
async fn dispatch(
    state: &AppState,
    job: &JobResource,
    args: Vec<String>,
) -> AppResult<TriggerResult> {
    let outcome = state.runner.run_job(job, &args).await?;

    tracing::info!(
        job = %job,
        execution = outcome.execution_id(),
        confirmed = outcome.is_confirmed(),
        "Job execution triggered",
    );

    Ok(TriggerResult {
        status: STATUS_ACCEPTED,
        job: job.job.clone(),
        region: job.region.clone(),
        execution: outcome.execution_id().to_string(),
        args,
    })
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// POST /run
///
/// Validate the body, trigger the job, and return 202 with the execution.
/// Configuration is checked before the body is looked at.
pub async fn run(State(state): State<AppState>, body: Bytes) -> AppResult<impl IntoResponse> {
    let job = state.config.job.resource()?;

    let args = TriggerRequest::from_body(&body)
        .resolve_args(SourcePolicy::StrictMp4)
        .inspect_err(|err| tracing::warn!(error = %err, "Rejected run request"))?;

    let result = dispatch(&state, &job, args).await?;
    Ok((StatusCode::ACCEPTED, Json(result)))
}

// ---------------------------------------------------------------------------
// Compatibility surface
// ---------------------------------------------------------------------------

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        ok: true,
        hint: INDEX_HINT,
    })
}

/// POST /
///
/// Greets when the body has neither `source` nor `args`; otherwise behaves
/// like `/run` with lenient `source` validation. A missing project id is
/// reported ahead of validation errors.
pub async fn submit(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let received = parse_body(&body);
    let request = TriggerRequest::from_value(&received);

    match request.intent(SourcePolicy::Lenient) {
        Ok(TriggerIntent::Greeting { name }) => {
            tracing::debug!(%name, "Compatibility greeting");
            let greeting = GreetingResponse {
                message: format!("Hello, {name}!"),
                received,
            };
            Ok((StatusCode::OK, Json(greeting)).into_response())
        }
        Ok(TriggerIntent::Dispatch(args)) => {
            let job = state.config.job.resource()?;
            let result = dispatch(&state, &job, args).await?;
            Ok((StatusCode::ACCEPTED, Json(result)).into_response())
        }
        Err(err) => {
            state.config.job.resource()?;
            tracing::warn!(error = %err, "Rejected compatibility request");
            Err(AppError::Core(err))
        }
    }
}
