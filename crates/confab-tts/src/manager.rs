//! Audio engine manager — named registry with atomic reload, plus the
//! synthesis cache over the audio log.
//!
//! Mirrors the chat manager: the registry is immutable and swapped whole on
//! reload. The manager additionally owns the audio log, recording every
//! fresh synthesis and replaying cached artifacts without a network call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use confab_core::config::{is_invalid_endpoint, GatewayConfig};
use confab_core::store::AudioLogStore;
use confab_core::types::AudioSynthesisResult;
use confab_core::wav::{self, HEADER_LEN};
use confab_core::EngineError;

use crate::buffered::BufferedTtsEngine;
use crate::sink::PlaybackSink;
use crate::streaming::StreamingTtsEngine;
use crate::traits::AudioEngine;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// An immutable set of named audio engines plus the default choice.
/// Lookups are case-insensitive.
pub struct AudioRegistry {
    default_name: String,
    engines: HashMap<String, Arc<dyn AudioEngine>>,
}

impl AudioRegistry {
    /// Build a registry from explicit engine instances.
    pub fn from_engines(
        default_name: &str,
        engines: Vec<(String, Arc<dyn AudioEngine>)>,
    ) -> Result<Self, EngineError> {
        let mut map: HashMap<String, Arc<dyn AudioEngine>> = HashMap::new();
        for (name, engine) in engines {
            let key = name.to_lowercase();
            if map.insert(key, engine).is_some() {
                return Err(EngineError::Config(format!(
                    "duplicate TTS engine name '{}'",
                    name
                )));
            }
        }

        let default_key = default_name.to_lowercase();
        if !map.is_empty() && !map.contains_key(&default_key) {
            return Err(EngineError::Config(format!(
                "default TTS engine '{}' is not among the configured engines",
                default_name
            )));
        }

        Ok(AudioRegistry {
            default_name: default_key,
            engines: map,
        })
    }

    /// Build engines from config. The `streaming` flag picks the adapter.
    pub fn from_config(
        config: &GatewayConfig,
        sink: Arc<PlaybackSink>,
    ) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let mut engines: Vec<(String, Arc<dyn AudioEngine>)> = Vec::new();
        for entry in &config.tts.engines {
            if is_invalid_endpoint(&entry.endpoint) {
                return Err(EngineError::Config(format!(
                    "TTS engine '{}' has an invalid endpoint",
                    entry.name
                )));
            }
            let engine: Arc<dyn AudioEngine> = if entry.streaming {
                Arc::new(StreamingTtsEngine::new(
                    &entry.name,
                    &entry.endpoint,
                    entry.voice.clone(),
                    &entry.output_dir,
                    timeout,
                    sink.clone(),
                ))
            } else {
                Arc::new(BufferedTtsEngine::new(
                    &entry.name,
                    &entry.endpoint,
                    entry.voice.clone(),
                    &entry.output_dir,
                    timeout,
                    sink.clone(),
                ))
            };
            engines.push((entry.name.clone(), engine));
        }

        Self::from_engines(&config.tts.default_engine, engines)
    }

    /// Look up an engine by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AudioEngine>> {
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

/// Front door of the audio pipeline.
pub struct AudioEngineManager {
    registry: RwLock<Arc<AudioRegistry>>,
    audio_log: Arc<AudioLogStore>,
    sink: Arc<PlaybackSink>,
}

impl std::fmt::Debug for AudioEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngineManager").finish_non_exhaustive()
    }
}

impl AudioEngineManager {
    pub fn new(
        config: &GatewayConfig,
        audio_log: Arc<AudioLogStore>,
        sink: Arc<PlaybackSink>,
    ) -> Result<Self, EngineError> {
        let registry = AudioRegistry::from_config(config, sink.clone())?;
        info!(engines = registry.engines.len(), default = %registry.default_name, "audio registry built");
        Ok(AudioEngineManager {
            registry: RwLock::new(Arc::new(registry)),
            audio_log,
            sink,
        })
    }

    /// Wrap an already-built registry.
    pub fn from_registry(
        registry: AudioRegistry,
        audio_log: Arc<AudioLogStore>,
        sink: Arc<PlaybackSink>,
    ) -> Self {
        AudioEngineManager {
            registry: RwLock::new(Arc::new(registry)),
            audio_log,
            sink,
        }
    }

    /// Rebuild the registry from new config and swap it in. On failure the
    /// previous registry stays active untouched.
    pub async fn reload(&self, config: &GatewayConfig) -> Result<(), EngineError> {
        let fresh = AudioRegistry::from_config(config, self.sink.clone())?;
        let mut guard = self.registry.write().await;
        *guard = Arc::new(fresh);
        info!("audio registry reloaded");
        Ok(())
    }

    /// The active registry snapshot.
    pub async fn snapshot(&self) -> Arc<AudioRegistry> {
        self.registry.read().await.clone()
    }

    async fn resolve(&self, engine: Option<&str>) -> Result<Arc<dyn AudioEngine>, EngineError> {
        let registry = self.snapshot().await;
        let name = engine.unwrap_or(registry.default_name());
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::unknown_engine(name, registry.names()))
    }

    /// Synthesize `text` through the named engine (default when `None`) and
    /// record the artifact in the audio log.
    pub async fn synthesize(
        &self,
        text: &str,
        engine: Option<&str>,
    ) -> Result<AudioSynthesisResult, EngineError> {
        let engine = self.resolve(engine).await?;
        let result = engine.synthesize(text).await?;
        self.audio_log
            .record(text, &result.path.to_string_lossy())?;
        Ok(result)
    }

    /// Like [`synthesize`](Self::synthesize), but replay the saved artifact
    /// when this exact text was synthesized before. A stale log entry
    /// (artifact deleted or unreadable) falls back to fresh synthesis.
    pub async fn synthesize_cached(
        &self,
        text: &str,
        engine: Option<&str>,
    ) -> Result<AudioSynthesisResult, EngineError> {
        if let Some(path) = self.audio_log.lookup(text)? {
            match self.replay(&path).await {
                Ok(result) => {
                    debug!(path = %path, "replayed cached synthesis");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "cached artifact unusable, resynthesizing");
                }
            }
        }
        self.synthesize(text, engine).await
    }

    /// Decode a saved WAV artifact and queue it for playback.
    async fn replay(&self, path: &str) -> Result<AudioSynthesisResult, EngineError> {
        let bytes = tokio::fs::read(path).await?;
        let spec = wav::parse_header(&bytes)?;
        let pcm = &bytes[HEADER_LEN..];

        self.sink.push(&wav::pcm16_to_f32(pcm));

        Ok(AudioSynthesisResult {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            pcm: pcm.to_vec(),
            path: path.into(),
        })
    }

    /// Cancel any in-flight synthesis on every engine and drop queued
    /// samples.
    pub async fn cancel(&self) {
        let registry = self.snapshot().await;
        for engine in registry.engines.values() {
            engine.cancel();
        }
        self.sink.clear();
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
