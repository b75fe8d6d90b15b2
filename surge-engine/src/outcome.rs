use http::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The result of exactly one request against one target. Produced by an
/// executor task, handed to the aggregator over the wave channel, and
/// consumed exactly once.
#[derive(Debug)]
pub struct Outcome {
    pub target: String,
    pub disposition: Disposition,
    pub elapsed: Duration,
    pub response: Option<CapturedResponse>,
}

/// How a request ended: an HTTP status (any code, including 4xx/5xx), or a
/// transport-level failure. A status code is present exactly when no
/// failure occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Status(StatusCode),
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The per-request timer expired before a full response arrived.
    Timeout,
    /// Any other network-level failure. Carries the error text with the
    /// target URL already stripped out.
    Transport(String),
}

impl Disposition {
    /// Histogram label for this disposition: `"Timeout"`, the sanitized
    /// transport error text, or `"<code> : <reason>"` (e.g. `"200 : OK"`).
    pub fn label(&self) -> String {
        match self {
            Disposition::Status(status) => format!(
                "{} : {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            ),
            Disposition::Failed(kind) => kind.to_string(),
        }
    }

    /// Only transport errors and timeouts count as failures; HTTP error
    /// statuses do not.
    pub fn is_failure(&self) -> bool {
        matches!(self, Disposition::Failed(_))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "Timeout"),
            FailureKind::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

/// Strip the target URL out of a transport error message so classification
/// labels don't repeat it.
pub(crate) fn sanitize_transport_error(msg: &str, url: &str) -> String {
    msg.replace(url, "").trim().to_string()
}

/// A raw response retained for the results artifact. Only populated when
/// capture is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedResponse {
    /// Status line, e.g. `"200 OK"`.
    pub status: String,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as JSON, best effort; `None` if the body wasn't valid
    /// JSON.
    pub body: Option<serde_json::Value>,
}
