//! Configuration schema and loader.
//!
//! The gateway only reads resolved values — how the host edits or persists
//! its settings is its own business. JSON on disk uses **camelCase** keys;
//! Rust uses snake_case via `#[serde(rename_all = "camelCase")]`.
//!
//! Provider selection is a closed tagged enum rather than interface-typed
//! fields switched on a string: the provider set is exhaustively checkable
//! and each variant carries exactly the credentials it needs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;

// ─────────────────────────────────────────────
// Root config
// ─────────────────────────────────────────────

/// Root configuration for the chat and TTS pipelines.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// System prompt prepended to every chat payload.
    pub system_prompt: String,
    /// How many stored turns of context to send with each chat request.
    pub context_turns: usize,
    /// Bound on every outbound HTTP call, in seconds.
    pub request_timeout_secs: u64,
    pub chat: ChatConfig,
    pub tts: TtsConfig,
    pub stores: StoreConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            context_turns: 5,
            request_timeout_secs: 60,
            chat: ChatConfig::default(),
            tts: TtsConfig::default(),
            stores: StoreConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Chat engines
// ─────────────────────────────────────────────

/// Chat pipeline configuration: the named engines and the default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Name of the engine used when the caller doesn't pick one.
    pub default_engine: String,
    pub engines: Vec<ChatEngineConfig>,
}

/// One named chat engine entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEngineConfig {
    /// Registry key; unique case-insensitively.
    pub name: String,
    #[serde(flatten)]
    pub provider: ChatProviderConfig,
}

/// Provider kind plus its credentials. The `kind` tag selects the variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChatProviderConfig {
    /// Cloudflare Workers AI — account-scoped model path, bearer token.
    #[serde(rename = "cloudflare", rename_all = "camelCase")]
    Cloudflare {
        api_token: String,
        account_id: String,
        model: String,
    },
    /// OpenAI-style completions endpoint, `model` field in the payload.
    #[serde(rename = "openai", rename_all = "camelCase")]
    OpenAi {
        api_key: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        model: String,
    },
    /// OpenRouter — same payload shape as OpenAI, different endpoint/catalog.
    #[serde(rename = "openrouter", rename_all = "camelCase")]
    OpenRouter {
        api_key: String,
        #[serde(default = "default_openrouter_endpoint")]
        endpoint: String,
        model: String,
    },
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openrouter_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

// ─────────────────────────────────────────────
// TTS engines
// ─────────────────────────────────────────────

/// TTS pipeline configuration: the named engines and the default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsConfig {
    pub default_engine: String,
    pub engines: Vec<TtsEngineConfig>,
}

/// One named TTS engine entry (GPT-SoVITS-compatible server).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsEngineConfig {
    /// Registry key; unique case-insensitively.
    pub name: String,
    /// Synthesis endpoint URL.
    pub endpoint: String,
    /// Incremental delivery (header-then-PCM stream) vs one-shot buffer.
    #[serde(default)]
    pub streaming: bool,
    /// Directory where synthesized WAV artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub voice: SovitsVoice,
}

fn default_output_dir() -> String {
    "tts_output".to_string()
}

/// Voice/language parameters for the GPT-SoVITS request payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SovitsVoice {
    pub text_lang: String,
    pub ref_audio_path: String,
    pub prompt_text: String,
    pub prompt_lang: String,
    pub text_split_method: String,
    pub batch_size: u32,
    pub media_type: String,
}

impl Default for SovitsVoice {
    fn default() -> Self {
        Self {
            text_lang: "zh".to_string(),
            ref_audio_path: String::new(),
            prompt_text: String::new(),
            prompt_lang: "zh".to_string(),
            text_split_method: "cut5".to_string(),
            batch_size: 1,
            media_type: "wav".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Stores
// ─────────────────────────────────────────────

/// File paths for the persisted stores.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub conversation_path: String,
    pub audio_log_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            conversation_path: "data/conversation.jsonl".to_string(),
            audio_log_path: "data/audio_log.jsonl".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────

/// Whether a credential value is unusable: empty or a known placeholder.
pub fn is_placeholder_credential(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("xxx")
        || trimmed.starts_with("YOUR_")
        || trimmed.starts_with("<")
}

/// Whether an endpoint value is unusable before any network attempt.
pub fn is_invalid_endpoint(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.contains("XXX")
        || !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
}

impl GatewayConfig {
    /// Check the config for placeholder credentials, bad endpoints, missing
    /// defaults, and duplicate engine names. Returns the first problem found
    /// so the host can surface it before any network call is made.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.system_prompt.trim().is_empty() {
            return Err(EngineError::Config("system prompt is empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request timeout must be non-zero".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for engine in &self.chat.engines {
            if !seen.insert(engine.name.to_lowercase()) {
                return Err(EngineError::Config(format!(
                    "duplicate chat engine name '{}'",
                    engine.name
                )));
            }
            engine.provider.validate(&engine.name)?;
        }
        if !self.chat.engines.is_empty() {
            self.require_default(&self.chat.default_engine, &seen, "chat")?;
        }

        let mut seen_tts = std::collections::HashSet::new();
        for engine in &self.tts.engines {
            if !seen_tts.insert(engine.name.to_lowercase()) {
                return Err(EngineError::Config(format!(
                    "duplicate TTS engine name '{}'",
                    engine.name
                )));
            }
            if is_invalid_endpoint(&engine.endpoint) {
                return Err(EngineError::Config(format!(
                    "TTS engine '{}' has an invalid endpoint",
                    engine.name
                )));
            }
        }
        if !self.tts.engines.is_empty() {
            self.require_default(&self.tts.default_engine, &seen_tts, "TTS")?;
        }

        Ok(())
    }

    fn require_default(
        &self,
        default: &str,
        names: &std::collections::HashSet<String>,
        kind: &str,
    ) -> Result<(), EngineError> {
        if default.trim().is_empty() {
            return Err(EngineError::Config(format!(
                "no default {} engine configured",
                kind
            )));
        }
        if !names.contains(&default.to_lowercase()) {
            return Err(EngineError::Config(format!(
                "default {} engine '{}' is not among the configured engines",
                kind, default
            )));
        }
        Ok(())
    }
}

impl ChatProviderConfig {
    /// Fail fast on placeholder credentials — a misconfigured key must never
    /// turn into a network timeout.
    pub fn validate(&self, engine_name: &str) -> Result<(), EngineError> {
        match self {
            ChatProviderConfig::Cloudflare {
                api_token,
                account_id,
                model,
            } => {
                if is_placeholder_credential(api_token) {
                    return Err(EngineError::Config(format!(
                        "chat engine '{}': Cloudflare API token is missing or a placeholder",
                        engine_name
                    )));
                }
                if is_placeholder_credential(account_id) {
                    return Err(EngineError::Config(format!(
                        "chat engine '{}': Cloudflare account ID is missing or a placeholder",
                        engine_name
                    )));
                }
                if model.trim().is_empty() {
                    return Err(EngineError::Config(format!(
                        "chat engine '{}': no model configured",
                        engine_name
                    )));
                }
            }
            ChatProviderConfig::OpenAi {
                api_key, endpoint, ..
            }
            | ChatProviderConfig::OpenRouter {
                api_key, endpoint, ..
            } => {
                if is_placeholder_credential(api_key) {
                    return Err(EngineError::Config(format!(
                        "chat engine '{}': API key is missing or a placeholder",
                        engine_name
                    )));
                }
                if is_invalid_endpoint(endpoint) {
                    return Err(EngineError::Config(format!(
                        "chat engine '{}': endpoint is not a valid http(s) URL",
                        engine_name
                    )));
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Loading / saving
// ─────────────────────────────────────────────

impl GatewayConfig {
    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse config JSON: {}", e)))?;
        Ok(config)
    }

    /// Load config, falling back to defaults if the file is missing or bad.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file found at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk (pretty-printed JSON with camelCase keys).
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!("Config saved to {}", path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
