//! Streaming synthesis adapter — PCM reaches the sink while the server is
//! still rendering.
//!
//! The server sends a WAV byte stream: 44-byte header first, then PCM in
//! whatever chunk sizes the transport produces. Chunks are decoded through
//! the [`StreamAssembler`] and pushed to the sink as they arrive, so
//! playback can begin within the first chunks. `cancel` is a hard barrier:
//! the transfer stops, queued samples are dropped, and the call returns
//! `Cancelled` with no artifact written.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use confab_core::config::SovitsVoice;
use confab_core::types::AudioSynthesisResult;
use confab_core::utils::timestamped_wav_name;
use confab_core::wav;
use confab_core::EngineError;

use crate::assembler::StreamAssembler;
use crate::http::{build_client, map_transport_error};
use crate::request::SovitsRequest;
use crate::sink::PlaybackSink;
use crate::traits::AudioEngine;

struct CancelBarrier {
    requested: AtomicBool,
    notify: Notify,
    /// Serializes stream writes against `cancel()`: once a cancel holds this
    /// lock and sets the flag, no later chunk can reach the sink or the
    /// accumulation buffer.
    gate: std::sync::Mutex<()>,
}

/// Chunked GPT-SoVITS adapter with mid-stream cancellation.
pub struct StreamingTtsEngine {
    display_name: String,
    endpoint: String,
    voice: SovitsVoice,
    output_dir: PathBuf,
    client: reqwest::Client,
    sink: Arc<PlaybackSink>,
    cancel: Arc<CancelBarrier>,
}

impl StreamingTtsEngine {
    pub fn new(
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
        voice: SovitsVoice,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
        sink: Arc<PlaybackSink>,
    ) -> Self {
        StreamingTtsEngine {
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            voice,
            output_dir: output_dir.into(),
            client: build_client(timeout),
            sink,
            cancel: Arc::new(CancelBarrier {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
                gate: std::sync::Mutex::new(()),
            }),
        }
    }

    /// Decode one chunk and forward its PCM, under the cancel gate. A
    /// cancel that already committed wins over the chunk.
    fn feed(&self, assembler: &mut StreamAssembler, chunk: &[u8]) -> Result<(), EngineError> {
        let _gate = self.cancel.gate.lock().unwrap();
        if self.cancel.requested.load(Ordering::SeqCst) {
            return Err(EngineError::Cancelled);
        }
        let pcm = assembler.push(chunk)?;
        if !pcm.is_empty() {
            self.sink.push(&wav::pcm16_to_f32(&pcm));
        }
        Ok(())
    }

    fn cancelled(&self) -> Result<(), EngineError> {
        if self.cancel.requested.load(Ordering::SeqCst) {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AudioEngine for StreamingTtsEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioSynthesisResult, EngineError> {
        // A new synthesis consumes any cancel left over from the last one
        self.cancel.requested.store(false, Ordering::SeqCst);

        let request = SovitsRequest::new(text, &self.voice, true);
        debug!(engine = %self.display_name, chars = text.len(), "requesting streamed synthesis");

        let response = tokio::select! {
            _ = self.cancel.notify.notified() => {
                self.sink.clear();
                return Err(EngineError::Cancelled);
            }
            sent = self.client.post(&self.endpoint).json(&request).send() => {
                sent.map_err(map_transport_error)?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Synthesis(format!(
                "TTS server returned {}: {}",
                status.as_u16(),
                confab_core::utils::truncate_string(&body, 200)
            )));
        }

        let mut stream = response.bytes_stream();
        let mut assembler = StreamAssembler::new();

        loop {
            // Catches a cancel that landed between selects, where the
            // notification has already come and gone
            self.cancelled()?;
            tokio::select! {
                _ = self.cancel.notify.notified() => {
                    warn!(engine = %self.display_name, "synthesis cancelled mid-stream");
                    return Err(EngineError::Cancelled);
                }
                next = stream.next() => match next {
                    Some(Ok(chunk)) => self.feed(&mut assembler, &chunk)?,
                    Some(Err(e)) => return Err(map_transport_error(e)),
                    None => break,
                }
            }
        }
        // The last barrier: a cancel that landed with the final chunk still
        // wins over a completed stream
        self.cancelled()?;

        let spec = assembler.spec().ok_or_else(|| {
            EngineError::Synthesis("stream ended before a complete WAV header".to_string())
        })?;
        let pcm = assembler.pcm().to_vec();
        let file_bytes = assembler.into_wav()?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(timestamped_wav_name());
        tokio::fs::write(&path, &file_bytes).await?;

        info!(
            engine = %self.display_name,
            sample_rate = spec.sample_rate,
            pcm_bytes = pcm.len(),
            path = %path.display(),
            "streamed synthesis complete"
        );

        Ok(AudioSynthesisResult {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            pcm,
            path,
        })
    }

    fn cancel(&self) {
        {
            let _gate = self.cancel.gate.lock().unwrap();
            self.cancel.requested.store(true, Ordering::SeqCst);
            self.sink.clear();
        }
        self.cancel.notify.notify_waiters();
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
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_engine(
        server_url: &str,
    ) -> (Arc<StreamingTtsEngine>, Arc<PlaybackSink>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(PlaybackSink::new(1 << 20));
        let engine = Arc::new(StreamingTtsEngine::new(
            "sovits-stream",
            format!("{}/tts", server_url),
            SovitsVoice::default(),
            dir.path().join("out"),
            Duration::from_secs(5),
            sink.clone(),
        ));
        (engine, sink, dir)
    }

    fn sample_wav(pcm_len: usize) -> Vec<u8> {
        let pcm: Vec<u8> = (0..pcm_len).map(|i| i as u8).collect();
        wav::build_wav_bytes(&pcm, 32000, 1)
    }

    #[tokio::test]
    async fn test_streamed_synthesis_success() {
        let server = MockServer::start().await;
        let wav_body = sample_wav(300);
        Mock::given(method("POST"))
            .and(path("/tts"))
            .and(body_partial_json(serde_json::json!({
                "streaming_mode": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());
        let result = engine.synthesize("hello").await.unwrap();

        assert_eq!(result.sample_rate, 32000);
        assert_eq!(result.pcm.len(), 300);
        assert_eq!(sink.len(), 150);

        // The rebuilt artifact matches the original stream
        let saved = std::fs::read(&result.path).unwrap();
        assert_eq!(saved, wav_body);
    }

    #[tokio::test]
    async fn test_cancel_during_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(sample_wav(1 << 16))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let (engine, sink, dir) = make_engine(&server.uri());
        let task = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.synthesize("long text").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));

        // Hard barrier: nothing queued, nothing saved
        assert!(sink.is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_synthesis_after_cancel_works() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_wav(50)))
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());

        // A stale cancel from before must not poison the next run
        engine.cancel();
        let result = engine.synthesize("hello").await.unwrap();
        assert_eq!(result.pcm.len(), 50);
        assert_eq!(sink.len(), 25);
    }

    #[tokio::test]
    async fn test_server_error_is_synthesis_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let (engine, _sink, _dir) = make_engine(&server.uri());
        let err = engine.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_an_error() {
        let server = MockServer::start().await;
        // Fewer than 44 bytes: the header never completes
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 20]))
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());
        let err = engine.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert!(sink.is_empty());
    }
}
