//! Persisted stores — append-only JSONL logs.
//!
//! File format: one JSON object per line, append-only. Both stores keep a
//! single-writer discipline via an internal mutex; readers parse whole lines
//! and skip a partially-written trailing line, so they always see a
//! consistent snapshot.

pub mod audio_log;
pub mod conversation;

pub use audio_log::AudioLogStore;
pub use conversation::ConversationStore;
