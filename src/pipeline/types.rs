//! Types flowing into and out of the answer pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::openai::ModelError;

/// A non-empty user question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Validates raw user input.
    ///
    /// Blank or whitespace-only input is rejected. Anything else is kept
    /// verbatim, so the model sees exactly what the user typed.
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::Question;
    ///
    /// let q = Question::parse("  What is the capital of France? ").unwrap();
    /// assert_eq!(q.as_str(), "  What is the capital of France? ");
    /// assert!(Question::parse("   ").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, AskError> {
        if input.trim().is_empty() {
            Err(AskError::EmptyQuestion)
        } else {
            Ok(Self(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One successfully fetched and summarized page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedSummary {
    pub url: String,
    pub summary: String,
}

impl SourcedSummary {
    pub fn new(url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            summary: summary.into(),
        }
    }
}

/// Final output of one pipeline run.
///
/// `sourced_summaries` follows search ranking, minus any URL whose fetch or
/// summary failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerBundle {
    pub direct_answer: String,
    pub sourced_summaries: Vec<SourcedSummary>,
}

impl AnswerBundle {
    pub fn has_sources(&self) -> bool {
        !self.sourced_summaries.is_empty()
    }
}

/// Stages of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AnsweringDirectly,
    SearchingWeb,
    Summarizing,
    Done,
    Failed,
}

impl PipelineState {
    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AnsweringDirectly => write!(f, "answering"),
            Self::SearchingWeb => write!(f, "searching the web"),
            Self::Summarizing => write!(f, "summarizing sources"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Failures that abort a pipeline run and are shown to the user.
///
/// Search, fetch and summary failures never appear here: they are logged and
/// skipped at the point where they happen.
#[derive(Debug, Error)]
pub enum AskError {
    /// The caller passed a blank question
    #[error("Please enter a question to get a response.")]
    EmptyQuestion,

    /// No API key is configured; nothing was sent over the network
    #[error("OpenAI API key is missing. Please set the OPENAI_API_KEY environment variable.")]
    MissingCredential,

    /// The model provider rejected the credential
    #[error("{0}")]
    UpstreamAuth(#[source] ModelError),

    /// Any other model provider failure on the direct answer
    #[error("An error occurred: {0}")]
    Upstream(#[source] ModelError),
}

impl AskError {
    /// Returns `true` for errors caused by user input or local setup.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::EmptyQuestion | Self::MissingCredential)
    }
}

impl From<ModelError> for AskError {
    fn from(error: ModelError) -> Self {
        if error.is_auth() {
            Self::UpstreamAuth(error)
        } else {
            Self::Upstream(error)
        }
    }
}

impl TryFrom<ConfigError> for AskError {
    type Error = ConfigError;

    /// Only a missing credential maps onto the pipeline taxonomy.
    fn try_from(error: ConfigError) -> Result<Self, Self::Error> {
        match error {
            ConfigError::MissingCredential => Ok(Self::MissingCredential),
            other => Err(other),
        }
    }
}

/// Tunables for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// When false, only the direct answer is produced
    pub search_enabled: bool,
    /// Soft cap on search results
    pub num_results: usize,
    /// Paragraphs considered per page
    pub max_paragraphs: usize,
    /// Character budget per page excerpt
    pub max_chars: usize,
    /// Token cap for the direct answer
    pub answer_max_tokens: u32,
    /// Token cap for each page summary
    pub summary_max_tokens: u32,
    /// Fetch and summarize sources on separate threads
    pub parallel: bool,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            search_enabled: true,
            num_results: settings.num_results(),
            max_paragraphs: settings.max_paragraphs(),
            max_chars: settings.max_chars(),
            answer_max_tokens: settings.answer_max_tokens(),
            summary_max_tokens: settings.summary_max_tokens(),
            parallel: false,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        use crate::config::{
            DEFAULT_MAX_CHARS, DEFAULT_MAX_PARAGRAPHS, DEFAULT_MAX_TOKENS, DEFAULT_NUM_RESULTS,
        };

        Self {
            search_enabled: true,
            num_results: DEFAULT_NUM_RESULTS,
            max_paragraphs: DEFAULT_MAX_PARAGRAPHS,
            max_chars: DEFAULT_MAX_CHARS,
            answer_max_tokens: DEFAULT_MAX_TOKENS,
            summary_max_tokens: DEFAULT_MAX_TOKENS,
            parallel: false,
        }
    }
}
