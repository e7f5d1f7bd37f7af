/// OpenAI HTTP client implementation.
///
/// This module provides `OpenAiClient` for making synchronous chat-completion
/// requests, along with the error type shared by every language model backend.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{ApiKey, Settings};

/// Errors that can occur when calling a language model provider.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// The provider rejected the credential
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Non-auth HTTP errors with status code
    #[error("HTTP error: status {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Provider answered but the payload was unusable
    #[error("API error: {message}")]
    Api { message: String },
}

impl ModelError {
    /// Returns `true` when the provider rejected the credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, ModelError::Auth { .. })
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ModelError::Timeout(error)
        } else {
            ModelError::Network(error)
        }
    }
}

/// Trait for text completion backends.
///
/// The pipeline only ever sees this trait, which lets tests substitute
/// scripted fakes for the real HTTP client.
pub trait LanguageModel: Send + Sync {
    /// Sends `prompt` as a single user message and returns the first
    /// completion's text, trimmed of surrounding whitespace.
    ///
    /// Exactly one outbound request per call; no retries.
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Synchronous client for the OpenAI chat-completions endpoint.
///
/// Construct it from resolved [`Settings`]; the credential travels with the
/// client rather than living in process-wide state.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    /// Builds a client using the model, endpoint, credential and timeout in `settings`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use webqa::config::SettingsBuilder;
    /// use webqa::openai::{LanguageModel, OpenAiClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let settings = SettingsBuilder::new().api_key("sk-...").build()?;
    /// let client = OpenAiClient::from_settings(&settings)?;
    /// let answer = client.complete("Say hello in one word.", 10)?;
    /// println!("{answer}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_settings(settings: &Settings) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(ModelError::Network)?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url()),
            model: settings.model().to_string(),
            api_key: settings.api_key().clone(),
        })
    }

    /// Returns the chat-completions URL this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl LanguageModel for OpenAiClient {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        debug!(model = %self.model, max_tokens, prompt_chars = prompt.chars().count(), "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .map_err(ModelError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(ModelError::from_reqwest)?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        parse_completion(&body)
    }
}

/// Extracts the first choice's text from a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, ModelError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(ModelError::Serialization)?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ModelError::Api {
            message: "Missing 'choices[0].message.content' in API response".to_string(),
        })
}

/// Maps a non-success response onto an error, separating credential rejection
/// from every other provider failure.
fn classify_failure(status: u16, body: &str) -> ModelError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let auth_code = parsed.as_ref().is_some_and(|e| {
        matches!(e.code.as_deref(), Some("invalid_api_key"))
            || matches!(e.kind.as_deref(), Some("authentication_error"))
    });

    let message = match parsed {
        Some(e) if !e.message.is_empty() => e.message,
        _ => body.trim().to_string(),
    };

    if status == 401 || status == 403 || auth_code {
        ModelError::Auth { message }
    } else {
        ModelError::Http { status, message }
    }
}
