//! Core types — conversation turns, wire-format messages, and the
//! provider response envelopes.
//!
//! Wire types model the chat-completions JSON format shared by OpenAI and
//! OpenRouter, plus the Cloudflare Workers AI envelope. Everything is typed
//! serde structs; no hand extraction of fields from raw bodies.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Who authored a stored conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The wire-format role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted turn of a conversation. Immutable once written; only the
/// store's `clear()` removes turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, message: impl Into<String>) -> Self {
        ConversationTurn {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────
// Audio log entries
// ─────────────────────────────────────────────

/// Persisted mapping from synthesized text to the produced audio artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioLogEntry {
    pub message: String,
    pub audio_path: String,
    pub timestamp: DateTime<Utc>,
}

impl AudioLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(message: impl Into<String>, audio_path: impl Into<String>) -> Self {
        AudioLogEntry {
            message: message.into(),
            audio_path: audio_path.into(),
            timestamp: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────
// Chat wire format (requests)
// ─────────────────────────────────────────────

/// A message entry in a provider payload (`{role, content}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for a chat-completions-style endpoint.
///
/// Cloudflare Workers AI takes the model in the URL path, so `model` is
/// optional and omitted from the body when absent.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
}

// ─────────────────────────────────────────────
// Chat wire format (responses)
// ─────────────────────────────────────────────

/// OpenAI/OpenRouter response envelope; parsed down to
/// `choices[0].message.content`.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantReply,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message within a choice.
#[derive(Debug, Deserialize)]
pub struct AssistantReply {
    pub content: Option<String>,
}

/// Token usage statistics, when the provider reports them.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Cloudflare Workers AI response envelope
/// (`{"result":{"response":"..."},"success":true,"errors":[]}`).
#[derive(Debug, Deserialize)]
pub struct WorkersAiResponse {
    #[serde(default)]
    pub result: Option<WorkersAiResult>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// The `result` object of a Workers AI response.
#[derive(Debug, Deserialize)]
pub struct WorkersAiResult {
    pub response: Option<String>,
}

// ─────────────────────────────────────────────
// Audio synthesis result
// ─────────────────────────────────────────────

/// A completed synthesis: decoded format parameters, the raw PCM payload,
/// and the path of the saved WAV artifact.
#[derive(Clone, Debug)]
pub struct AudioSynthesisResult {
    pub sample_rate: u32,
    pub channels: u16,
    pub pcm: Vec<u8>,
    pub path: PathBuf,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
