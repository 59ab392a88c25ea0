//! Chat pipeline — provider adapters and the engine manager.
//!
//! Each remote chat-completion provider gets one adapter implementing the
//! [`ChatEngine`] trait; the [`ChatEngineManager`] dispatches to the named
//! (or default) adapter from an atomically-swapped registry.

pub mod cloudflare;
mod http;
pub mod manager;
pub mod openai;
pub mod openrouter;
pub mod payload;
pub mod traits;

pub use cloudflare::CloudflareEngine;
pub use manager::{ChatEngineManager, ChatRegistry};
pub use openai::OpenAiEngine;
pub use openrouter::OpenRouterEngine;
pub use traits::{ChatEngine, EngineOptions};
