//! The audio engine trait.

use async_trait::async_trait;

use confab_core::types::AudioSynthesisResult;
use confab_core::EngineError;

/// A TTS adapter: text in, queued playback plus a saved WAV artifact out.
///
/// `synthesize` feeds decoded PCM into the playback sink (incrementally or
/// all at once, depending on the adapter) and writes the complete WAV to
/// the configured output directory. `cancel` stops an in-flight synthesis
/// at a hard barrier: after it returns, no further samples reach the sink
/// from that synthesis.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioSynthesisResult, EngineError>;

    /// Abort the in-flight synthesis, if any, and drop queued samples.
    /// Safe to call when nothing is running.
    fn cancel(&self);

    /// Human-readable engine name for logs and error messages.
    fn display_name(&self) -> &str;
}
