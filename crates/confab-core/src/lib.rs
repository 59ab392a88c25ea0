//! Core building blocks for the Confab engine gateway.
//!
//! Shared by the chat and TTS pipelines: typed wire formats, the error
//! taxonomy, configuration schema, the persisted conversation/audio-log
//! stores, and the WAV codec.

pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod utils;
pub mod wav;

pub use error::EngineError;
