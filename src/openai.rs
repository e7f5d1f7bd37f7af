/// OpenAI chat-completions client module.
///
/// This module provides a synchronous HTTP client for the chat-completions API,
/// the `LanguageModel` trait the pipeline depends on, and the client's error type.
mod client;

pub use client::{LanguageModel, ModelError, OpenAiClient};
