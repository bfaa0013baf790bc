//! Shared HTTP client construction, headers and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};

use crate::error::RelayError;

/// Build a reusable client. Construct once at startup and share it.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, RelayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| RelayError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Send a call to a serverless function endpoint and read its answer.
///
/// The whole exchange, body included, must finish within `budget`; running
/// over is a [`RelayError::Timeout`]. Non-2xx answers are returned as-is for
/// the caller to interpret.
pub async fn send_within(
    request: reqwest::RequestBuilder,
    budget: Duration,
) -> Result<(StatusCode, String), RelayError> {
    let exchange = async {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok::<_, RelayError>((status, body))
    };
    tokio::time::timeout(budget, exchange)
        .await
        .map_err(|_| RelayError::Timeout(budget.as_millis() as u64))?
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Bearer headers plus the Assistants v2 opt-in header.
pub fn assistants_headers(api_key: &str) -> HeaderMap {
    let mut headers = bearer_headers(api_key);
    headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
    headers
}

/// Map a non-success engine response to an error.
pub fn status_to_error(status: u16, body: &str) -> RelayError {
    RelayError::api(status, extract_error_message(body).unwrap_or_else(|| body.to_string()))
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
}

pub fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Append the serverless function key as a `code` query parameter.
pub fn with_function_key(url: &str, function_key: Option<&str>) -> Result<Url, RelayError> {
    let mut url = Url::parse(url)
        .map_err(|e| RelayError::Configuration(format!("Invalid URL '{url}': {e}")))?;
    if let Some(key) = function_key.filter(|k| !k.is_empty()) {
        url.query_pairs_mut().append_pair("code", key);
    }
    Ok(url)
}
