//! Shared response handling for the HTTP clients

use crate::UpstreamError;
use serde_json::Value;
use std::time::Duration;

/// Body fields upstreams use to explain a failure, in lookup order
const CAUSE_FIELDS: [&str; 2] = ["cause", "errorMessage"];

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| UpstreamError::Communication(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn send_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Communication(format!("Request timed out: {}", e))
    } else {
        UpstreamError::Communication(format!("Request failed: {}", e))
    }
}

/// Turn a response into its JSON body, or a status error carrying the upstream's cause
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let cause = cause_from_body(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            cause,
        });
    }

    let bytes = response.bytes().await.map_err(send_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

fn cause_from_body(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    CAUSE_FIELDS
        .iter()
        .find_map(|field| json.get(*field).and_then(Value::as_str))
        .filter(|cause| !cause.is_empty())
        .map(str::to_string)
}
