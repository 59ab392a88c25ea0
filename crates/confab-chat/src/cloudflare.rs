//! Cloudflare Workers AI adapter.
//!
//! Workers AI is not a chat-completions clone: the model is addressed in the
//! URL path (`/accounts/{id}/ai/run/@cf/meta/{model}`) and the reply comes
//! back wrapped in a `{result, success, errors}` envelope.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use confab_core::types::{ChatCompletionRequest, ChatMessage, Role, WorkersAiResponse};
use confab_core::EngineError;

use crate::http::{build_client, post_json};
use crate::payload::build_messages;
use crate::traits::{ChatEngine, EngineOptions, TEST_SYSTEM_PROMPT, TEST_USER_MESSAGE};

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com";

/// Chat engine backed by Cloudflare Workers AI.
pub struct CloudflareEngine {
    display_name: String,
    api_token: String,
    account_id: String,
    model: String,
    api_base: String,
    client: reqwest::Client,
    opts: EngineOptions,
}

impl CloudflareEngine {
    pub fn new(
        display_name: impl Into<String>,
        api_token: impl Into<String>,
        account_id: impl Into<String>,
        model: impl Into<String>,
        opts: EngineOptions,
    ) -> Self {
        let client = build_client(opts.timeout);
        CloudflareEngine {
            display_name: display_name.into(),
            api_token: api_token.into(),
            account_id: account_id.into(),
            model: model.into(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            opts,
        }
    }

    /// Override the API base URL (for tests against a local server).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn run_url(&self, model: &str) -> String {
        format!(
            "{}/client/v4/accounts/{}/ai/run/@cf/meta/{}",
            self.api_base, self.account_id, model
        )
    }

    /// One round trip: POST the message list, unwrap the Workers AI
    /// envelope.
    async fn request_reply(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<String, EngineError> {
        // Model rides in the URL, not the body
        let body = ChatCompletionRequest {
            model: None,
            messages,
        };
        let raw = post_json(&self.client, &self.run_url(model), &self.api_token, &body).await?;

        let envelope: WorkersAiResponse = serde_json::from_str(&raw)
            .map_err(|e| EngineError::parse(format!("not a Workers AI envelope: {}", e), &raw))?;

        if !envelope.success {
            let detail = serde_json::to_string(&envelope.errors)
                .unwrap_or_else(|_| "unreported".to_string());
            return Err(EngineError::Request {
                status: None,
                detail: format!("Workers AI reported failure: {}", detail),
            });
        }

        envelope
            .result
            .and_then(|r| r.response)
            .ok_or_else(|| EngineError::parse("missing 'result.response'", &raw))
    }
}

#[async_trait]
impl ChatEngine for CloudflareEngine {
    async fn send_chat(
        &self,
        prompt: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, EngineError> {
        let model = model.unwrap_or(&self.model);
        let system_prompt = system_prompt.unwrap_or(&self.opts.system_prompt);

        let context = self.opts.store.last_n(self.opts.context_turns)?;
        let messages = build_messages(system_prompt, &context, prompt);
        debug!(
            engine = %self.display_name,
            model,
            messages = messages.len(),
            "sending chat request"
        );

        let reply = self.request_reply(messages, model).await?;

        // Persist the exchange only after the provider succeeded
        self.opts.store.append(Role::User, prompt)?;
        self.opts.store.append(Role::Assistant, &reply)?;

        info!(engine = %self.display_name, chars = reply.len(), "chat reply received");
        Ok(reply)
    }

    async fn test_connection(&self, model: Option<&str>) -> bool {
        let model = model.unwrap_or(&self.model);
        let messages = vec![
            ChatMessage::system(TEST_SYSTEM_PROMPT),
            ChatMessage::user(TEST_USER_MESSAGE),
        ];

        match self.request_reply(messages, model).await {
            Ok(reply) if !reply.trim().is_empty() => {
                debug!(engine = %self.display_name, "connection test passed");
                true
            }
            Ok(_) => {
                warn!(engine = %self.display_name, "connection test returned an empty reply");
                false
            }
            Err(e) => {
                warn!(engine = %self.display_name, error = %e, "connection test failed");
                false
            }
        }
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
