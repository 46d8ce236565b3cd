//! Language model access.
//!
//! Agents only depend on the [`LanguageModel`] trait: a prompt goes in, the
//! fully decoded answer text comes out. [`OllamaClient`] talks to a streaming
//! chat endpoint; [`ScriptedModel`] replays canned answers for offline runs.

pub mod decoder;
mod errors;
mod ollama;
mod scripted;

pub use decoder::{decode_stream, extract_fenced, StreamDecoder};
pub use errors::{LlmError, LlmResult};
pub use ollama::{LlmConfig, OllamaClient};
pub use scripted::ScriptedModel;

use async_trait::async_trait;

/// A model that answers a single prompt with text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run the prompt and return the concatenated answer
    async fn complete(&self, prompt: &str) -> LlmResult<String>;
}
