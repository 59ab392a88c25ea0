//! Shared HTTP plumbing for the synthesis adapters.

use std::time::Duration;

use confab_core::EngineError;

/// Build the shared HTTP client with the configured per-request bound.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Map a transport-level reqwest failure into the engine taxonomy.
pub(crate) fn map_transport_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::Synthesis(format!("TTS request failed: {}", e))
    }
}
