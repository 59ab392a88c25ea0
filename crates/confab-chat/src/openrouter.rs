//! OpenRouter adapter.
//!
//! OpenRouter speaks the OpenAI chat-completions protocol verbatim; only the
//! endpoint and the model catalog (`vendor/model` names) differ, so this is
//! a thin wrapper over the OpenAI wire logic.

use async_trait::async_trait;

use confab_core::EngineError;

use crate::openai::OpenAiEngine;
use crate::traits::{ChatEngine, EngineOptions};

/// Chat engine backed by OpenRouter's completions endpoint.
pub struct OpenRouterEngine {
    inner: OpenAiEngine,
}

impl OpenRouterEngine {
    pub fn new(
        display_name: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        opts: EngineOptions,
    ) -> Self {
        OpenRouterEngine {
            inner: OpenAiEngine::new(display_name, api_key, endpoint, model, opts),
        }
    }
}

#[async_trait]
impl ChatEngine for OpenRouterEngine {
    async fn send_chat(
        &self,
        prompt: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, EngineError> {
        self.inner.send_chat_impl(prompt, model, system_prompt).await
    }

    async fn test_connection(&self, model: Option<&str>) -> bool {
        self.inner.test_connection_impl(model).await
    }

    fn display_name(&self) -> &str {
        self.inner.display_name()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use confab_core::store::ConversationStore;
    use confab_core::types::Role;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_engine(server_url: &str) -> (OpenRouterEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConversationStore::new(dir.path().join("c.jsonl")).unwrap());
        let opts = EngineOptions {
            store,
            system_prompt: "Be concise.".to_string(),
            context_turns: 5,
            timeout: Duration::from_secs(5),
        };
        let engine = OpenRouterEngine::new(
            "OpenRouter",
            "sk-or-test",
            format!("{}/api/v1/chat/completions", server_url),
            "meta-llama/llama-3-70b-instruct",
            opts,
        );
        (engine, dir)
    }

    #[tokio::test]
    async fn test_send_chat_with_catalog_model_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(body_partial_json(
                json!({ "model": "meta-llama/llama-3-70b-instruct" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "routed" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let reply = engine.send_chat("hi", None, None).await.unwrap();
        assert_eq!(reply, "routed");

        let turns = engine.inner.options().store.last_n(10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_display_name() {
        let (engine, _dir) = make_engine("http://127.0.0.1:1");
        assert_eq!(engine.display_name(), "OpenRouter");
    }
}
