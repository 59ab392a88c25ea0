//! Audio pipeline — GPT-SoVITS synthesis adapters, the playback sink, and
//! the audio engine manager.
//!
//! Two delivery modes share one trait: the buffered adapter downloads a
//! complete WAV and hands it over at once, the streaming adapter feeds PCM
//! into the sink as chunks arrive and supports mid-stream cancellation.

pub mod assembler;
pub mod buffered;
mod http;
pub mod manager;
pub mod request;
pub mod sink;
pub mod streaming;
pub mod traits;

pub use assembler::StreamAssembler;
pub use buffered::BufferedTtsEngine;
pub use manager::{AudioEngineManager, AudioRegistry};
pub use sink::PlaybackSink;
pub use streaming::StreamingTtsEngine;
pub use traits::AudioEngine;
