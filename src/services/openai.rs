//! Shared pieces of the OpenAI HTTP clients.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Build an HTTP client with the configured request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Join the base URL and an endpoint path.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Extract `error.message` from an API error body, falling back to the raw body.
pub(crate) fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
