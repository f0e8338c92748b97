//! Response bodies returned by the trigger endpoints.

use serde::Serialize;

/// Status reported for every accepted dispatch.
pub const STATUS_ACCEPTED: &str = "accepted";

/// Body of a `202 Accepted` dispatch.
#[derive(Debug, Serialize)]
pub struct TriggerResult {
    /// Always [`STATUS_ACCEPTED`].
    pub status: &'static str,
    /// Job name from configuration.
    pub job: String,
    /// Region from configuration.
    pub region: String,
    /// Execution identifier reported by the execution service.
    pub execution: String,
    /// Container arguments the job was started with.
    pub args: Vec<String>,
}

/// Body of the compatibility greeting.
#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub message: String,
    /// The request body as received (after lenient parsing).
    pub received: serde_json::Value,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub ok: bool,
    pub hint: &'static str,
}
