#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use golfrun_api::config::{JobConfig, ServerConfig};
use golfrun_api::router::build_app_router;
use golfrun_api::state::AppState;
use golfrun_cloud::{CloudError, JobRunner, RunOutcome};
use golfrun_core::job::JobResource;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const PROJECT: &str = "acme-golf";
pub const EXECUTION: &str =
    "projects/acme-golf/locations/asia-southeast1/jobs/golf-analyzer-job/executions/golf-analyzer-job-4n8qz";

// ---------------------------------------------------------------------------
// Fake runner
// ---------------------------------------------------------------------------

/// What [`RecordingRunner`] answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Execution(String),
    Pending {
        operation: String,
        execution: Option<String>,
    },
    ApiError {
        status: u16,
        body: String,
    },
    /// Sleep this long, then confirm the execution.
    Stall(Duration),
    Panic,
}

/// A [`JobRunner`] that records every call and answers with a fixed reply.
pub struct RecordingRunner {
    reply: Reply,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingRunner {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn confirmed() -> Arc<Self> {
        Self::new(Reply::Execution(EXECUTION.to_string()))
    }

    /// `(job resource name, args)` for every call so far.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobRunner for RecordingRunner {
    async fn run_job(&self, job: &JobResource, args: &[String]) -> Result<RunOutcome, CloudError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.to_string(), args.to_vec()));

        match &self.reply {
            Reply::Execution(name) => Ok(RunOutcome::Execution { name: name.clone() }),
            Reply::Pending {
                operation,
                execution,
            } => Ok(RunOutcome::Pending {
                operation: operation.clone(),
                execution: execution.clone(),
            }),
            Reply::ApiError { status, body } => Err(CloudError::Api {
                status: *status,
                body: body.clone(),
            }),
            Reply::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(RunOutcome::Execution {
                    name: EXECUTION.to_string(),
                })
            }
            Reply::Panic => panic!("runner exploded"),
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` targeting the default job in `project`.
pub fn test_config(project: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        job: JobConfig {
            project_id: project.map(str::to_string),
            region: "asia-southeast1".to_string(),
            job_name: "golf-analyzer-job".to_string(),
        },
        run_timeout_secs: 5,
        await_execution: true,
        cloud_run_endpoint: "http://127.0.0.1:9".to_string(),
        access_token: Some("test-token".to_string()),
    }
}

/// Build the full application router (same middleware stack as production)
/// around the given runner.
pub fn build_test_app(config: ServerConfig, runner: Arc<RecordingRunner>) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        runner,
    };
    build_app_router(state, &config)
}

/// Router with a configured project and a runner that confirms executions.
pub fn configured_app() -> (Router, Arc<RecordingRunner>) {
    let runner = RecordingRunner::confirmed();
    let app = build_test_app(test_config(Some(PROJECT)), Arc::clone(&runner));
    (app, runner)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST an arbitrary body with no content type.
pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
