//! Stream assembler — splits a chunked WAV byte stream into header and PCM.
//!
//! Network chunks don't respect the 44-byte header boundary: the header can
//! arrive split across chunks, and the chunk that completes it usually
//! carries the first PCM bytes too. The assembler buffers until the header
//! is whole, parses the format once, then passes PCM straight through while
//! also accumulating it for the final file rebuild.

use confab_core::wav::{self, WavSpec, HEADER_LEN};
use confab_core::EngineError;

/// Incremental WAV stream decoder.
pub struct StreamAssembler {
    header: Vec<u8>,
    spec: Option<WavSpec>,
    pcm: Vec<u8>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        StreamAssembler {
            header: Vec::with_capacity(HEADER_LEN),
            spec: None,
            pcm: Vec::new(),
        }
    }

    /// Feed one network chunk. Returns the PCM bytes this chunk contributed
    /// (empty while the header is still incomplete).
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EngineError> {
        if self.spec.is_some() {
            self.pcm.extend_from_slice(chunk);
            return Ok(chunk.to_vec());
        }

        let needed = HEADER_LEN - self.header.len();
        if chunk.len() < needed {
            self.header.extend_from_slice(chunk);
            return Ok(Vec::new());
        }

        // This chunk completes the header; the rest is PCM
        self.header.extend_from_slice(&chunk[..needed]);
        self.spec = Some(wav::parse_header(&self.header)?);

        let rest = &chunk[needed..];
        self.pcm.extend_from_slice(rest);
        Ok(rest.to_vec())
    }

    /// Format parameters, once the header has been parsed.
    pub fn spec(&self) -> Option<WavSpec> {
        self.spec
    }

    /// All PCM accumulated so far.
    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// Rebuild a complete WAV file from the accumulated stream. Fails if
    /// the stream ended before the header was whole.
    pub fn into_wav(self) -> Result<Vec<u8>, EngineError> {
        let spec = self.spec.ok_or_else(|| {
            EngineError::Synthesis(format!(
                "stream ended mid-header: {} of {} bytes",
                self.header.len(),
                HEADER_LEN
            ))
        })?;
        Ok(wav::build_wav_bytes(&self.pcm, spec.sample_rate, spec.channels))
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
