//! Playback sink — a bounded ring of f32 samples between synthesis and the
//! host's audio output.
//!
//! The producer side is an adapter pushing decoded PCM; the consumer is the
//! host's audio callback pulling fixed-size frames. Underrun yields
//! silence, never an error; overflow drops the oldest samples so playback
//! stays near the live edge of a stream.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::{debug, warn};

/// Default ring capacity in samples (~8 seconds of mono 32 kHz audio).
pub const DEFAULT_CAPACITY: usize = 8 * 32_000;

/// Bounded sample ring shared between a synthesis task and an audio
/// callback.
pub struct PlaybackSink {
    inner: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl PlaybackSink {
    pub fn new(capacity: usize) -> Self {
        PlaybackSink {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity,
        }
    }

    /// Queue samples for playback. When the ring is full the **oldest**
    /// samples are dropped first.
    pub fn push(&self, samples: &[f32]) {
        let mut ring = self.inner.lock().unwrap();

        let incoming = samples.len().min(self.capacity);
        // Samples beyond capacity could never survive; keep the newest
        let samples = &samples[samples.len() - incoming..];

        let overflow = (ring.len() + incoming).saturating_sub(self.capacity);
        if overflow > 0 {
            ring.drain(..overflow);
            warn!(dropped = overflow, "playback ring overflow");
        }
        ring.extend(samples.iter().copied());
    }

    /// Fill `out` with queued samples. Underrun pads the remainder with
    /// silence; the return value is how many real samples were written.
    pub fn pull(&self, out: &mut [f32]) -> usize {
        let mut ring = self.inner.lock().unwrap();
        let available = ring.len().min(out.len());
        for slot in out.iter_mut().take(available) {
            *slot = ring.pop_front().unwrap_or(0.0);
        }
        out[available..].fill(0.0);
        available
    }

    /// Drop everything queued. Used on cancellation so no stale audio plays
    /// after the stop.
    pub fn clear(&self) {
        let mut ring = self.inner.lock().unwrap();
        let dropped = ring.len();
        ring.clear();
        if dropped > 0 {
            debug!(dropped, "playback ring cleared");
        }
    }

    /// Samples currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PlaybackSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
