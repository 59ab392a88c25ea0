//! Chat engine manager — named registry with atomic reload.
//!
//! The registry is immutable once built; reconfiguration builds a fresh
//! registry off to the side and swaps it in as one `Arc` store. In-flight
//! requests keep the snapshot they resolved against, so a reload never
//! tears an exchange in half.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use confab_core::config::{ChatProviderConfig, GatewayConfig};
use confab_core::store::ConversationStore;
use confab_core::EngineError;

use crate::cloudflare::CloudflareEngine;
use crate::openai::OpenAiEngine;
use crate::openrouter::OpenRouterEngine;
use crate::traits::{ChatEngine, EngineOptions};

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// An immutable set of named chat engines plus the default choice.
/// Lookups are case-insensitive.
pub struct ChatRegistry {
    default_name: String,
    engines: HashMap<String, Arc<dyn ChatEngine>>,
}

impl std::fmt::Debug for ChatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRegistry")
            .field("default_name", &self.default_name)
            .finish_non_exhaustive()
    }
}

impl ChatRegistry {
    /// Build a registry from explicit engine instances.
    pub fn from_engines(
        default_name: &str,
        engines: Vec<(String, Arc<dyn ChatEngine>)>,
    ) -> Result<Self, EngineError> {
        let mut map: HashMap<String, Arc<dyn ChatEngine>> = HashMap::new();
        for (name, engine) in engines {
            let key = name.to_lowercase();
            if map.insert(key, engine).is_some() {
                return Err(EngineError::Config(format!(
                    "duplicate chat engine name '{}'",
                    name
                )));
            }
        }

        let default_key = default_name.to_lowercase();
        if !map.is_empty() && !map.contains_key(&default_key) {
            return Err(EngineError::Config(format!(
                "default chat engine '{}' is not among the configured engines",
                default_name
            )));
        }

        Ok(ChatRegistry {
            default_name: default_key,
            engines: map,
        })
    }

    /// Build engines from config. Fails on the first bad entry; nothing is
    /// partially constructed for the caller.
    pub fn from_config(
        config: &GatewayConfig,
        store: Arc<ConversationStore>,
    ) -> Result<Self, EngineError> {
        let opts = EngineOptions {
            store,
            system_prompt: config.system_prompt.clone(),
            context_turns: config.context_turns,
            timeout: Duration::from_secs(config.request_timeout_secs),
        };

        let mut engines: Vec<(String, Arc<dyn ChatEngine>)> = Vec::new();
        for entry in &config.chat.engines {
            entry.provider.validate(&entry.name)?;
            let engine: Arc<dyn ChatEngine> = match &entry.provider {
                ChatProviderConfig::Cloudflare {
                    api_token,
                    account_id,
                    model,
                } => Arc::new(CloudflareEngine::new(
                    &entry.name,
                    api_token,
                    account_id,
                    model,
                    opts.clone(),
                )),
                ChatProviderConfig::OpenAi {
                    api_key,
                    endpoint,
                    model,
                } => Arc::new(OpenAiEngine::new(
                    &entry.name,
                    api_key,
                    endpoint,
                    model,
                    opts.clone(),
                )),
                ChatProviderConfig::OpenRouter {
                    api_key,
                    endpoint,
                    model,
                } => Arc::new(OpenRouterEngine::new(
                    &entry.name,
                    api_key,
                    endpoint,
                    model,
                    opts.clone(),
                )),
            };
            engines.push((entry.name.clone(), engine));
        }

        Self::from_engines(&config.chat.default_engine, engines)
    }

    /// Look up an engine by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ChatEngine>> {
        self.engines.get(&name.to_lowercase())
    }

    /// Sorted engine names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    /// The configured default engine name (lowercased).
    pub fn default_name(&self) -> &str {
        &self.default_name
    }
}

// ─────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────

/// Front door of the chat pipeline: resolves engine names against the
/// active registry and dispatches.
pub struct ChatEngineManager {
    registry: RwLock<Arc<ChatRegistry>>,
}

impl std::fmt::Debug for ChatEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngineManager").finish_non_exhaustive()
    }
}

impl ChatEngineManager {
    pub fn new(config: &GatewayConfig, store: Arc<ConversationStore>) -> Result<Self, EngineError> {
        let registry = ChatRegistry::from_config(config, store)?;
        info!(engines = registry.engines.len(), default = %registry.default_name, "chat registry built");
        Ok(ChatEngineManager {
            registry: RwLock::new(Arc::new(registry)),
        })
    }

    /// Wrap an already-built registry (used when engines are constructed by
    /// hand rather than from config).
    pub fn from_registry(registry: ChatRegistry) -> Self {
        ChatEngineManager {
            registry: RwLock::new(Arc::new(registry)),
        }
    }

    /// Rebuild the registry from new config and swap it in. On failure the
    /// previous registry stays active untouched.
    pub async fn reload(
        &self,
        config: &GatewayConfig,
        store: Arc<ConversationStore>,
    ) -> Result<(), EngineError> {
        let fresh = ChatRegistry::from_config(config, store)?;
        let mut guard = self.registry.write().await;
        *guard = Arc::new(fresh);
        info!("chat registry reloaded");
        Ok(())
    }

    /// The active registry snapshot. Holders keep a consistent view across
    /// reloads.
    pub async fn snapshot(&self) -> Arc<ChatRegistry> {
        self.registry.read().await.clone()
    }

    /// Send a prompt through the named engine, or the default when `engine`
    /// is `None`.
    pub async fn send(
        &self,
        prompt: &str,
        engine: Option<&str>,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<String, EngineError> {
        let registry = self.snapshot().await;
        let name = engine.unwrap_or(registry.default_name());
        let engine = registry
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::unknown_engine(name, registry.names()))?;

        engine.send_chat(prompt, model, system_prompt).await
    }

    /// Probe the default engine.
    pub async fn test_default(&self) -> bool {
        let registry = self.snapshot().await;
        let name = registry.default_name().to_string();
        self.test_named(&name).await
    }

    /// Probe a named engine. Unknown names report `false` rather than an
    /// error — probes never throw.
    pub async fn test_named(&self, name: &str) -> bool {
        let registry = self.snapshot().await;
        match registry.get(name) {
            Some(engine) => engine.test_connection(None).await,
            None => {
                warn!(engine = %name, "connection test requested for unknown engine");
                false
            }
        }
    }

    /// Sorted names of the currently registered engines.
    pub async fn engine_names(&self) -> Vec<String> {
        self.snapshot().await.names()
    }

    /// Name of the current default engine.
    pub async fn default_engine(&self) -> String {
        self.snapshot().await.default_name().to_string()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
