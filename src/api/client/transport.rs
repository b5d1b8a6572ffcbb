//! HTTP transport helpers for API requests.

use crate::error::ApiError;
use serde_json::Value;
use std::time::Duration;

/// Build an HTTP client with timeout applied.
pub(super) fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send one GET request and decode its JSON body.
pub(super) async fn get_json(
    http: &reqwest::Client,
    url: &str,
    query: &[(String, String)],
    bearer: Option<&str>,
) -> Result<Value, ApiError> {
    let mut req = http.get(url).query(query);
    if let Some(token) = bearer.filter(|value| !value.trim().is_empty()) {
        req = req.header("Authorization", format!("Bearer {token}"));
    }

    let response = req.send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}
