//! Buffered synthesis adapter — one request, one complete WAV back.
//!
//! Simplest delivery mode: the server renders the whole utterance before
//! responding, so playback starts only after the download finishes. No
//! mid-flight cancellation; `cancel` just drops whatever is still queued
//! in the sink.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use confab_core::config::SovitsVoice;
use confab_core::types::AudioSynthesisResult;
use confab_core::utils::timestamped_wav_name;
use confab_core::wav::{self, HEADER_LEN};
use confab_core::EngineError;

use crate::http::{build_client, map_transport_error};
use crate::request::SovitsRequest;
use crate::sink::PlaybackSink;
use crate::traits::AudioEngine;

/// One-shot GPT-SoVITS adapter.
pub struct BufferedTtsEngine {
    display_name: String,
    endpoint: String,
    voice: SovitsVoice,
    output_dir: PathBuf,
    client: reqwest::Client,
    sink: Arc<PlaybackSink>,
}

impl BufferedTtsEngine {
    pub fn new(
        display_name: impl Into<String>,
        endpoint: impl Into<String>,
        voice: SovitsVoice,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
        sink: Arc<PlaybackSink>,
    ) -> Self {
        BufferedTtsEngine {
            display_name: display_name.into(),
            endpoint: endpoint.into(),
            voice,
            output_dir: output_dir.into(),
            client: build_client(timeout),
            sink,
        }
    }
}

#[async_trait]
impl AudioEngine for BufferedTtsEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioSynthesisResult, EngineError> {
        let request = SovitsRequest::new(text, &self.voice, false);
        debug!(engine = %self.display_name, chars = text.len(), "requesting synthesis");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Synthesis(format!(
                "TTS server returned {}: {}",
                status.as_u16(),
                confab_core::utils::truncate_string(&body, 200)
            )));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let spec = wav::parse_header(&bytes)?;
        let pcm = &bytes[HEADER_LEN..];

        self.sink.push(&wav::pcm16_to_f32(pcm));

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(timestamped_wav_name());
        tokio::fs::write(&path, &bytes).await?;

        info!(
            engine = %self.display_name,
            sample_rate = spec.sample_rate,
            pcm_bytes = pcm.len(),
            path = %path.display(),
            "synthesis complete"
        );

        Ok(AudioSynthesisResult {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            pcm: pcm.to_vec(),
            path,
        })
    }

    fn cancel(&self) {
        self.sink.clear();
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

    fn make_engine(server_url: &str) -> (BufferedTtsEngine, Arc<PlaybackSink>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(PlaybackSink::new(1 << 20));
        let engine = BufferedTtsEngine::new(
            "sovits",
            format!("{}/tts", server_url),
            SovitsVoice::default(),
            dir.path().join("out"),
            Duration::from_secs(5),
            sink.clone(),
        );
        (engine, sink, dir)
    }

    fn sample_wav(pcm_len: usize) -> Vec<u8> {
        let pcm: Vec<u8> = (0..pcm_len).map(|i| i as u8).collect();
        wav::build_wav_bytes(&pcm, 32000, 1)
    }

    #[tokio::test]
    async fn test_synthesize_success() {
        let server = MockServer::start().await;
        let wav_body = sample_wav(200);
        Mock::given(method("POST"))
            .and(path("/tts"))
            .and(body_partial_json(serde_json::json!({
                "text": "hello",
                "streaming_mode": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());
        let result = engine.synthesize("hello").await.unwrap();

        assert_eq!(result.sample_rate, 32000);
        assert_eq!(result.channels, 1);
        assert_eq!(result.pcm.len(), 200);

        // Sink got the decoded samples (2 bytes per sample)
        assert_eq!(sink.len(), 100);

        // Saved artifact is the complete WAV file
        let saved = std::fs::read(&result.path).unwrap();
        assert_eq!(saved, wav_body);
        assert!(result.path.to_string_lossy().ends_with(".wav"));
    }

    #[tokio::test]
    async fn test_server_error_is_synthesis_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad ref audio"))
            .mount(&server)
            .await;

        let (engine, sink, dir) = make_engine(&server.uri());
        let err = engine.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad ref audio"));

        // Nothing played, nothing saved
        assert!(sink.is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_non_wav_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"error\":\"model not loaded\"}"),
            )
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());
        let err = engine.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(sample_wav(64))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(PlaybackSink::new(1 << 16));
        let engine = BufferedTtsEngine::new(
            "sovits",
            format!("{}/tts", server.uri()),
            SovitsVoice::default(),
            dir.path().join("out"),
            Duration::from_millis(100),
            sink.clone(),
        );

        let err = engine.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout));

        // Nothing played, nothing saved
        assert!(sink.is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_cancel_drops_queued_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_wav(64)))
            .mount(&server)
            .await;

        let (engine, sink, _dir) = make_engine(&server.uri());
        engine.synthesize("hello").await.unwrap();
        assert!(!sink.is_empty());

        engine.cancel();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_voice_parameters_in_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "text_lang": "zh",
                "text_split_method": "cut5",
                "media_type": "wav"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_wav(8)))
            .expect(1)
            .mount(&server)
            .await;

        let (engine, _sink, _dir) = make_engine(&server.uri());
        engine.synthesize("hello").await.unwrap();
    }
}
