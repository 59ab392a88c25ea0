//! The chat engine trait and shared construction options.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use confab_core::store::ConversationStore;
use confab_core::EngineError;

/// Fixed canary exchange used by connectivity probes. Kept deliberately
/// trivial so any reachable model produces a non-empty reply.
pub const TEST_SYSTEM_PROMPT: &str =
    "You are a test assistant. Reply to every message with the single digit 1.";

/// The user half of the canary exchange.
pub const TEST_USER_MESSAGE: &str = "Connection test.";

/// A chat provider adapter.
///
/// `send_chat` is the full pipeline step: build context from the store, call
/// the provider, persist the exchange, return the reply. `test_connection`
/// is a side-effect-free probe — it never touches the conversation store and
/// never returns an error.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Send `prompt` with stored context and return the assistant reply.
    ///
    /// On success the user prompt and the reply are appended to the
    /// conversation store, in that order. On any failure nothing is
    /// appended.
    async fn send_chat(
        &self,
        prompt: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, EngineError>;

    /// Probe connectivity with a fixed canary exchange. Returns `true` only
    /// if a non-empty assistant reply came back; all failures become
    /// `false`.
    async fn test_connection(&self, model: Option<&str>) -> bool;

    /// Human-readable engine name for logs and error messages.
    fn display_name(&self) -> &str;
}

/// Construction parameters shared by every adapter: the conversation store,
/// the configured system prompt, the context window, and the request bound.
#[derive(Clone)]
pub struct EngineOptions {
    pub store: Arc<ConversationStore>,
    pub system_prompt: String,
    pub context_turns: usize,
    pub timeout: Duration,
}
