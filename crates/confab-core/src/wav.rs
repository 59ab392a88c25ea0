//! WAV container codec — canonical 44-byte RIFF/WAVE/fmt/data layout,
//! 16-bit PCM.
//!
//! The streaming TTS path parses the header off the front of the byte
//! stream to recover playback parameters, then reconstructs a complete
//! file from accumulated PCM once the stream ends. Byte offsets follow the
//! canonical layout: channels at 22, sample rate at 24, data length at 40.

use crate::error::EngineError;

/// Length of the canonical PCM WAV header.
pub const HEADER_LEN: usize = 44;

/// Bits per sample for everything we produce or consume.
const BITS_PER_SAMPLE: u16 = 16;

/// Format parameters recovered from a WAV header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
}

/// Parse the canonical 44-byte header from the front of `bytes`.
///
/// Fails with `Synthesis` if there are fewer than 44 bytes, the RIFF/WAVE
/// magic is wrong, or the format parameters are zero.
pub fn parse_header(bytes: &[u8]) -> Result<WavSpec, EngineError> {
    if bytes.len() < HEADER_LEN {
        return Err(EngineError::Synthesis(format!(
            "WAV header too short: {} bytes, need {}",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(EngineError::Synthesis(
            "missing RIFF/WAVE magic in audio response".to_string(),
        ));
    }

    let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
    let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

    if channels == 0 || sample_rate == 0 {
        return Err(EngineError::Synthesis(format!(
            "invalid WAV format parameters: channels={}, sample_rate={}",
            channels, sample_rate
        )));
    }

    Ok(WavSpec {
        channels,
        sample_rate,
    })
}

/// The data-chunk length field (offset 40), when present.
pub fn data_len(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    Some(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]))
}

/// Assemble a complete WAV file: canonical header followed by `pcm`.
pub fn build_wav_bytes(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(BITS_PER_SAMPLE / 8);
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let file_size = 36 + pcm.len() as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());

    // RIFF chunk
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk (PCM)
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

/// Decode interleaved 16-bit little-endian PCM into f32 samples in [-1, 1].
///
/// A trailing odd byte (half a sample) is ignored.
pub fn pcm16_to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|pair| {
            let value = i16::from_le_bytes([pair[0], pair[1]]);
            f32::from(value) / 32768.0
        })
        .collect()
}

/// Encode f32 samples in [-1, 1] back to 16-bit little-endian PCM.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let value = (clamped * 32767.0) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
