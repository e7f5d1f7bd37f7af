pub mod config;
pub mod fetcher;
pub mod logging;
pub mod openai;
pub mod pipeline;
pub mod search;
pub mod tui;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, Settings, SettingsBuilder};
pub use fetcher::{ContentFetcher, FetchError, HttpFetcher};
pub use openai::{LanguageModel, ModelError, OpenAiClient};
pub use pipeline::{
    AnswerBundle, AnswerPipeline, AnswerPipelineBuilder, AskError, PipelineOptions, PipelineState,
    Question, SourcedSummary,
};
pub use search::{DuckDuckGoSearch, WebSearch};

/// Shown beneath every answer.
pub const DISCLAIMER: &str = "This assistant is powered by an OpenAI GPT model. The responses \
    generated may not always be accurate or reliable. Use the information provided at your own \
    discretion.";

/// Wires the real HTTP-backed components into a pipeline.
///
/// # Errors
///
/// Returns an error if any HTTP client cannot be constructed.
pub fn build_pipeline(settings: &Settings, options: PipelineOptions) -> anyhow::Result<AnswerPipeline> {
    use std::sync::Arc;

    let model = OpenAiClient::from_settings(settings)?;
    let search = DuckDuckGoSearch::new(settings.timeout())?;
    let fetcher = HttpFetcher::new(settings.timeout())?;

    Ok(AnswerPipelineBuilder::new()
        .model(Arc::new(model))
        .search(Arc::new(search))
        .fetcher(Arc::new(fetcher))
        .options(options)
        .build())
}
