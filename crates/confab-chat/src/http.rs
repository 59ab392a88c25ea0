//! Shared HTTP plumbing for the chat adapters.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use confab_core::EngineError;

/// Build the shared HTTP client with the configured per-request bound.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// POST a JSON body with a bearer token and return the raw response body.
///
/// Non-2xx statuses become `Request` errors carrying the status and a body
/// excerpt; elapsed timeouts become `Timeout`. Parsing the body is the
/// caller's job — each provider has its own envelope.
pub(crate) async fn post_json<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    bearer_token: &str,
    body: &B,
) -> Result<String, EngineError> {
    let response = client
        .post(url)
        .bearer_auth(bearer_token)
        .json(body)
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    let text = response.text().await.map_err(map_reqwest_error)?;

    if !status.is_success() {
        return Err(EngineError::Request {
            status: Some(status.as_u16()),
            detail: confab_core::utils::truncate_string(&text, 200),
        });
    }

    debug!(status = status.as_u16(), bytes = text.len(), "chat response received");
    Ok(text)
}

/// Map a transport-level reqwest failure into the engine taxonomy.
pub(crate) fn map_reqwest_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::Request {
            status: e.status().map(|s| s.as_u16()),
            detail: e.to_string(),
        }
    }
}
