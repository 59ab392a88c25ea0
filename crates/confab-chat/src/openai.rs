//! OpenAI chat-completions adapter.
//!
//! Plain `/v1/chat/completions` shape: model in the body, reply at
//! `choices[0].message.content`. The endpoint is configurable so any
//! API-compatible server works.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use confab_core::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role};
use confab_core::EngineError;

use crate::http::{build_client, post_json};
use crate::payload::build_messages;
use crate::traits::{ChatEngine, EngineOptions, TEST_SYSTEM_PROMPT, TEST_USER_MESSAGE};

/// Chat engine speaking the OpenAI chat-completions protocol.
pub struct OpenAiEngine {
    display_name: String,
    api_key: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
    opts: EngineOptions,
}

impl OpenAiEngine {
    pub fn new(
        display_name: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        opts: EngineOptions,
    ) -> Self {
        let client = build_client(opts.timeout);
        OpenAiEngine {
            display_name: display_name.into(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            client,
            opts,
        }
    }

    pub(crate) fn options(&self) -> &EngineOptions {
        &self.opts
    }

    /// One round trip: POST the message list, extract
    /// `choices[0].message.content`.
    pub(crate) async fn request_reply(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<String, EngineError> {
        let body = ChatCompletionRequest {
            model: Some(model.to_string()),
            messages,
        };
        let raw = post_json(&self.client, &self.endpoint, &self.api_key, &body).await?;

        let response: ChatCompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| EngineError::parse(format!("not a chat completion: {}", e), &raw))?;

        if let Some(usage) = &response.usage {
            debug!(
                engine = %self.display_name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "token usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::parse("missing 'choices[0].message.content'", &raw))
    }

    pub(crate) async fn send_chat_impl(
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

        self.opts.store.append(Role::User, prompt)?;
        self.opts.store.append(Role::Assistant, &reply)?;

        info!(engine = %self.display_name, chars = reply.len(), "chat reply received");
        Ok(reply)
    }

    pub(crate) async fn test_connection_impl(&self, model: Option<&str>) -> bool {
        let model = model.unwrap_or(&self.model);
        let messages = vec![
            ChatMessage::system(TEST_SYSTEM_PROMPT),
            ChatMessage::user(TEST_USER_MESSAGE),
        ];

        match self.request_reply(messages, model).await {
            Ok(reply) if !reply.trim().is_empty() => true,
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
}

#[async_trait]
impl ChatEngine for OpenAiEngine {
    async fn send_chat(
        &self,
        prompt: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, EngineError> {
        self.send_chat_impl(prompt, model, system_prompt).await
    }

    async fn test_connection(&self, model: Option<&str>) -> bool {
        self.test_connection_impl(model).await
    }

    fn display_name(&self) -> &str {
        &self.display_name
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
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_engine(server_url: &str) -> (OpenAiEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConversationStore::new(dir.path().join("c.jsonl")).unwrap());
        let opts = EngineOptions {
            store,
            system_prompt: "Be concise.".to_string(),
            context_turns: 5,
            timeout: Duration::from_secs(5),
        };
        let engine = OpenAiEngine::new(
            "OpenAI",
            "sk-test-key",
            format!("{}/v1/chat/completions", server_url),
            "gpt-4o-mini",
            opts,
        );
        (engine, dir)
    }

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
        })
    }

    #[tokio::test]
    async fn test_send_chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let reply = engine.send_chat("hi", None, None).await.unwrap();
        assert_eq!(reply, "Hello!");

        let turns = engine.opts.store.last_n(10).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].message, "hi");
        assert_eq!(turns[1].message, "Hello!");
    }

    #[tokio::test]
    async fn test_model_override_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "gpt-4o" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        engine.send_chat("hi", Some("gpt-4o"), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let err = engine.send_chat("hi", None, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
        assert!(engine.opts.store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_null_content_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let err = engine.send_chat("hi", None, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let err = engine.send_chat("hi", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Request {
                status: Some(429),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_custom_system_prompt_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [{ "role": "system", "content": "Talk like a pirate." }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Arr")))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        let reply = engine
            .send_chat("hi", None, Some("Talk like a pirate."))
            .await
            .unwrap();
        assert_eq!(reply, "Arr");
    }

    #[tokio::test]
    async fn test_connection_probe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("1")))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        assert!(engine.test_connection(None).await);
        assert!(engine.opts.store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_connection_false_on_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let (engine, _dir) = make_engine(&server.uri());
        assert!(!engine.test_connection(None).await);
    }
}
