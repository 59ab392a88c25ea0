//! Error taxonomy for the engine gateway.
//!
//! One closed enum shared by the chat and TTS pipelines. Adapters surface
//! these to the managers, which pass them through unchanged — the only error
//! a manager adds itself is `UnknownEngine`.

use thiserror::Error;

/// Maximum number of characters of a raw response body carried inside a
/// `Parse` error. Enough to diagnose a shape mismatch, small enough to log.
pub const FRAGMENT_MAX_CHARS: usize = 200;

/// All failure modes of the chat and audio pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or placeholder credential/endpoint. Raised before any
    /// network call is attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// Requested engine name is not in the active registry.
    #[error("engine '{name}' not found. Available engines: {}", available.join(", "))]
    UnknownEngine {
        name: String,
        available: Vec<String>,
    },

    /// Transport failure or non-2xx response.
    #[error("request failed{}: {detail}", status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Request {
        status: Option<u16>,
        detail: String,
    },

    /// Response body decoded but lacked the expected field.
    /// `fragment` is a truncated slice of the raw body for diagnosis.
    #[error("failed to parse response: {detail} (body: {fragment})")]
    Parse { detail: String, fragment: String },

    /// TTS-specific transport or decode failure.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Persistence layer failure (conversation store, audio log, artifacts).
    #[error("storage error: {0}")]
    Storage(String),

    /// The bounded per-request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// A streaming synthesis was aborted via `cancel()`. Not a provider
    /// failure — callers may treat this as a user action.
    #[error("synthesis cancelled")]
    Cancelled,
}

impl EngineError {
    /// Build an `UnknownEngine` error with a sorted list of available names.
    pub fn unknown_engine(name: impl Into<String>, available: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = available.into_iter().collect();
        names.sort();
        EngineError::UnknownEngine {
            name: name.into(),
            available: names,
        }
    }

    /// Build a `Parse` error, truncating the raw body to a loggable fragment.
    pub fn parse(detail: impl Into<String>, raw_body: &str) -> Self {
        EngineError::Parse {
            detail: detail.into(),
            fragment: crate::utils::truncate_string(raw_body, FRAGMENT_MAX_CHARS),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_engine_lists_names() {
        let err = EngineError::unknown_engine(
            "Bogus",
            vec!["openai".to_string(), "cloudflare".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("'Bogus'"));
        assert!(msg.contains("cloudflare, openai"));
    }

    #[test]
    fn test_request_error_with_status() {
        let err = EngineError::Request {
            status: Some(429),
            detail: "rate limited".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn test_request_error_without_status() {
        let err = EngineError::Request {
            status: None,
            detail: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn test_parse_error_truncates_fragment() {
        let body = "x".repeat(1000);
        let err = EngineError::parse("missing 'choices'", &body);
        match err {
            EngineError::Parse { fragment, .. } => {
                assert!(fragment.chars().count() <= FRAGMENT_MAX_CHARS);
                assert!(fragment.ends_with("..."));
            }
            _ => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn test_io_error_becomes_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Storage(_)));
        assert!(err.to_string().contains("denied"));
    }
}
