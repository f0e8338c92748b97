//! Inbound trigger requests and the rules that turn them into job arguments.
//!
//! A request either carries a ready-made `args` list, which is forwarded
//! verbatim, or describes a swing video via `source`, `view` and
//! `handedness`, which are validated and expanded into
//! `--source/--view/--handedness` flags.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// Storage URI scheme every `source` must start with.
pub const SOURCE_SCHEME: &str = "gs://";

/// Required `source` suffix under [`SourcePolicy::StrictMp4`].
pub const VIDEO_SUFFIX: &str = ".mp4";

/// Name used in the greeting when the request does not supply one.
pub const DEFAULT_GREETING_NAME: &str = "World";

/* --------------------------------------------------------------------------
Enumerations
-------------------------------------------------------------------------- */

/// Camera angle of the swing video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Face-on.
    #[default]
    Fo,
    /// Down-the-line.
    Dtl,
}

impl View {
    pub const ALL: [View; 2] = [View::Fo, View::Dtl];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Fo => "fo",
            View::Dtl => "dtl",
        }
    }
}

impl FromStr for View {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fo" => Ok(View::Fo),
            "dtl" => Ok(View::Dtl),
            _ => Err(invalid_choice("view", &View::ALL.map(|v| v.as_str()))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side the golfer swings from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    pub const ALL: [Handedness; 2] = [Handedness::Right, Handedness::Left];

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Right => "right",
            Handedness::Left => "left",
        }
    }
}

impl FromStr for Handedness {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "right" => Ok(Handedness::Right),
            "left" => Ok(Handedness::Left),
            _ => Err(invalid_choice(
                "handedness",
                &Handedness::ALL.map(|h| h.as_str()),
            )),
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strictly `source` is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Only the `gs://` scheme is required.
    Lenient,
    /// `gs://` scheme and a `.mp4` suffix are required.
    StrictMp4,
}

/* --------------------------------------------------------------------------
Request model
-------------------------------------------------------------------------- */

/// The inbound JSON body. Every field is optional and kept as raw JSON so
/// that validation can report field-specific messages instead of a generic
/// deserialization failure. JSON `null` deserializes to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub view: Option<Value>,
    #[serde(default)]
    pub handedness: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
}

/// What a request asks for once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerIntent {
    /// Trigger the job with these container arguments.
    Dispatch(Vec<String>),
    /// Compatibility greeting: neither `source` nor `args` was supplied.
    Greeting { name: String },
}

/// Parse a raw request body into a JSON object.
///
/// Empty bodies, invalid JSON and non-object JSON all become an empty
/// object; parsing never fails.
pub fn parse_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

impl TriggerRequest {
    /// Read the known fields out of a parsed body. Unknown fields are ignored.
    pub fn from_value(body: &Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or_default()
    }

    /// Convenience for `from_value(&parse_body(bytes))`.
    pub fn from_body(bytes: &[u8]) -> Self {
        Self::from_value(&parse_body(bytes))
    }

    /// Resolve the container argument list for a dispatch.
    ///
    /// A non-empty `args` array wins and is forwarded element-wise as
    /// strings; nothing else is looked at. Otherwise `source` is required
    /// and `view`/`handedness` fall back to their defaults.
    pub fn resolve_args(&self, policy: SourcePolicy) -> Result<Vec<String>, CoreError> {
        if let Some(args) = self.passthrough_args() {
            return Ok(args);
        }

        let source = validate_source(self.source.as_ref(), policy)?;
        let view: View =
            parse_choice(self.view.as_ref(), "view", &View::ALL.map(|v| v.as_str()))?;
        let handedness: Handedness = parse_choice(
            self.handedness.as_ref(),
            "handedness",
            &Handedness::ALL.map(|h| h.as_str()),
        )?;

        Ok(vec![
            "--source".to_string(),
            source,
            "--view".to_string(),
            view.to_string(),
            "--handedness".to_string(),
            handedness.to_string(),
        ])
    }

    /// Classify a request on the compatibility surface.
    ///
    /// Requests without `source` and without `args` are greetings; anything
    /// else goes through [`resolve_args`](Self::resolve_args).
    pub fn intent(&self, policy: SourcePolicy) -> Result<TriggerIntent, CoreError> {
        if self.source.is_none() && self.args.is_none() {
            let name = match &self.name {
                Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
                Some(Value::String(_)) | None => DEFAULT_GREETING_NAME.to_string(),
                Some(other) => stringify(other),
            };
            return Ok(TriggerIntent::Greeting { name });
        }

        self.resolve_args(policy).map(TriggerIntent::Dispatch)
    }

    fn passthrough_args(&self) -> Option<Vec<String>> {
        match &self.args {
            Some(Value::Array(items)) if !items.is_empty() => {
                Some(items.iter().map(stringify).collect())
            }
            _ => None,
        }
    }
}

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate a `source` value against the given policy and return it.
pub fn validate_source(source: Option<&Value>, policy: SourcePolicy) -> Result<String, CoreError> {
    let expected = match policy {
        SourcePolicy::Lenient => "gs://...",
        SourcePolicy::StrictMp4 => "gs://....mp4",
    };
    let invalid = || CoreError::Validation(format!("missing or invalid 'source' ({expected})"));

    let source = match source {
        Some(Value::String(s)) => s.trim(),
        _ => return Err(invalid()),
    };

    let object = source
        .strip_prefix(SOURCE_SCHEME)
        .and_then(|path| path.split_once('/'))
        .filter(|(bucket, object)| !bucket.is_empty() && !object.is_empty())
        .map(|(_, object)| object)
        .ok_or_else(invalid)?;

    if policy == SourcePolicy::StrictMp4 && !has_video_suffix(object) {
        return Err(invalid());
    }

    Ok(source.to_string())
}

/// The object name must be more than the suffix itself.
fn has_video_suffix(object: &str) -> bool {
    object.len() > VIDEO_SUFFIX.len()
        && object
            .get(object.len() - VIDEO_SUFFIX.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(VIDEO_SUFFIX))
}

/// Parse an optional enum field. Absent means the default; present values
/// must be strings whose lowercase form is a member of the enum.
fn parse_choice<T>(value: Option<&Value>, field: &str, allowed: &[&str]) -> Result<T, CoreError>
where
    T: FromStr<Err = CoreError> + Default,
{
    match value {
        None => Ok(T::default()),
        Some(Value::String(s)) => s.trim().parse(),
        Some(_) => Err(invalid_choice(field, allowed)),
    }
}

fn invalid_choice(field: &str, allowed: &[&str]) -> CoreError {
    CoreError::Validation(format!(
        "invalid '{field}' (expected one of: {})",
        allowed.join(", ")
    ))
}

/// Strings pass through unchanged; any other JSON value becomes its
/// compact JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
