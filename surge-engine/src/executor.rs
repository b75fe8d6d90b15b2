use crate::config::TargetSpec;
use crate::outcome::{sanitize_transport_error, CapturedResponse, Disposition, FailureKind, Outcome};
use http::{Request, StatusCode};
use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_rustls::HttpsConnector;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the shared client for a run. The client is stateless from the
/// engine's perspective and safe to clone into every executor task.
pub fn build_client() -> HttpsClient {
    Client::builder().build(HttpsConnector::new())
}

/// An invalid method/URL/header combination. This is a config bug, not a
/// transient fault, and aborts the whole run.
#[derive(Debug, Error)]
#[error("could not build request for target '{target}': {source}")]
pub struct RequestError {
    pub target: String,
    #[source]
    pub source: http::Error,
}

fn build_request(spec: &TargetSpec) -> Result<Request<Body>, http::Error> {
    let mut builder = Request::builder()
        .method(spec.method.as_str())
        .uri(spec.url.as_str());
    for (k, v) in spec.headers.iter() {
        builder = builder.header(k.as_str(), v.as_str());
    }
    let body = if spec.payload.is_empty() {
        Body::empty()
    } else {
        Body::from(spec.payload.clone())
    };
    builder.body(body)
}

/// Perform exactly one request against `spec` and classify the result.
///
/// The elapsed time covers dispatch through the full body read, success or
/// failure alike. Per-request network failures are turned into data here
/// and never propagate; only request construction errors bubble up.
pub async fn execute(
    client: &HttpsClient,
    target: &str,
    spec: &TargetSpec,
    timeout: Duration,
    capture: bool,
) -> Result<Outcome, RequestError> {
    let req = build_request(spec).map_err(|source| RequestError {
        target: target.to_string(),
        source,
    })?;
    let start = Instant::now();
    let (disposition, response) = match tokio::time::timeout(timeout, fetch(client, req, capture))
        .await
    {
        Err(_) => (Disposition::Failed(FailureKind::Timeout), None),
        Ok(Err(e)) => {
            let msg = sanitize_transport_error(&e.to_string(), &spec.url);
            (Disposition::Failed(FailureKind::Transport(msg)), None)
        }
        Ok(Ok((status, captured))) => (Disposition::Status(status), captured),
    };
    Ok(Outcome {
        target: target.to_string(),
        disposition,
        elapsed: start.elapsed(),
        response,
    })
}

async fn fetch(
    client: &HttpsClient,
    req: Request<Body>,
    capture: bool,
) -> Result<(StatusCode, Option<CapturedResponse>), hyper::Error> {
    let res = client.request(req).await?;
    let (parts, body) = res.into_parts();
    // Read the body to completion on every path so timing is comparable
    // whether or not capture is enabled.
    let bytes = hyper::body::to_bytes(body).await?;
    let captured = if capture {
        let headers: BTreeMap<String, String> = parts
            .headers
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    v.to_str().unwrap_or("<Non-ASCII>").to_string(),
                )
            })
            .collect();
        Some(CapturedResponse {
            status: format!(
                "{} {}",
                parts.status.as_u16(),
                parts.status.canonical_reason().unwrap_or("")
            ),
            headers,
            body: serde_json::from_slice(&bytes).ok(),
        })
    } else {
        None
    };
    Ok((parts.status, captured))
}
