//! The answer-augmentation pipeline.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::{ContentFetcher, FetchError};
use crate::openai::{LanguageModel, ModelError};
use crate::search::WebSearch;

use super::types::{AnswerBundle, AskError, PipelineOptions, PipelineState, Question, SourcedSummary};

/// Prompt prefix wrapped around page content for summarization.
const SUMMARY_TEMPLATE: &str = "Summarize the following content:\n\n{content}";

/// Why one source was skipped.
#[derive(Debug, Error)]
enum SourceFailure {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("summarize failed: {0}")]
    Summarize(#[from] ModelError),

    #[error("summarize returned empty text")]
    EmptySummary,
}

/// Builder for constructing `AnswerPipeline` instances.
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    model: Option<Arc<dyn LanguageModel>>,
    search: Option<Arc<dyn WebSearch>>,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    options: PipelineOptions,
}

impl AnswerPipelineBuilder {
    /// Creates a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the language model used for the direct answer and for summaries.
    pub fn model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the web search provider.
    pub fn search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets the page fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replaces the pipeline options.
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the `AnswerPipeline`.
    ///
    /// # Panics
    ///
    /// Panics if `model()`, `search()` or `fetcher()` was not called.
    #[must_use]
    pub fn build(self) -> AnswerPipeline {
        AnswerPipeline {
            model: self.model.expect("model must be set via model() method"),
            search: self.search.expect("search must be set via search() method"),
            fetcher: self.fetcher.expect("fetcher must be set via fetcher() method"),
            options: self.options,
        }
    }
}

/// Turns a question into a direct answer plus summaries of web sources.
///
/// The direct answer is mandatory: any model failure there aborts the run.
/// Everything after it is optional enrichment; a failed search continues with
/// no sources and a failed page is skipped without affecting the others.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use webqa::config::Settings;
/// use webqa::fetcher::HttpFetcher;
/// use webqa::openai::OpenAiClient;
/// use webqa::search::DuckDuckGoSearch;
/// use webqa::{AnswerPipelineBuilder, PipelineOptions, Question};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::from_env()?;
/// let pipeline = AnswerPipelineBuilder::new()
///     .model(Arc::new(OpenAiClient::from_settings(&settings)?))
///     .search(Arc::new(DuckDuckGoSearch::new(settings.timeout())?))
///     .fetcher(Arc::new(HttpFetcher::new(settings.timeout())?))
///     .options(PipelineOptions::from_settings(&settings))
///     .build();
///
/// let bundle = pipeline.answer(&Question::parse("What is the capital of France?")?)?;
/// println!("{}", bundle.direct_answer);
/// # Ok(())
/// # }
/// ```
pub struct AnswerPipeline {
    model: Arc<dyn LanguageModel>,
    search: Arc<dyn WebSearch>,
    fetcher: Arc<dyn ContentFetcher>,
    options: PipelineOptions,
}

impl AnswerPipeline {
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs the pipeline to completion.
    pub fn answer(&self, question: &Question) -> Result<AnswerBundle, AskError> {
        self.run(question, |_| {})
    }

    /// Runs the pipeline, reporting each state it enters to `observe`.
    ///
    /// The final reported state is always `Done` on success and `Failed`
    /// on error.
    pub fn run(
        &self,
        question: &Question,
        mut observe: impl FnMut(PipelineState),
    ) -> Result<AnswerBundle, AskError> {
        let mut enter = |state: PipelineState| {
            info!(%state, "pipeline state");
            observe(state);
        };

        enter(PipelineState::AnsweringDirectly);
        let direct_answer = match self.direct_answer(question) {
            Ok(answer) => answer,
            Err(e) => {
                enter(PipelineState::Failed);
                return Err(e);
            }
        };

        if !self.options.search_enabled {
            enter(PipelineState::Done);
            return Ok(AnswerBundle {
                direct_answer,
                sourced_summaries: Vec::new(),
            });
        }

        enter(PipelineState::SearchingWeb);
        let urls = dedup_preserving_order(
            self.search
                .search(question.as_str(), self.options.num_results),
        );
        if urls.is_empty() {
            warn!("no search results, answering without sources");
        }

        enter(PipelineState::Summarizing);
        let sourced_summaries = if self.options.parallel {
            self.summarize_parallel(&urls)
        } else {
            self.summarize_sequential(&urls)
        };

        enter(PipelineState::Done);
        Ok(AnswerBundle {
            direct_answer,
            sourced_summaries,
        })
    }

    fn direct_answer(&self, question: &Question) -> Result<String, AskError> {
        let answer = self
            .model
            .complete(question.as_str(), self.options.answer_max_tokens)?;

        if answer.trim().is_empty() {
            return Err(AskError::Upstream(ModelError::Api {
                message: "Model returned an empty answer".to_string(),
            }));
        }
        Ok(answer.trim().to_string())
    }

    fn summarize_sequential(&self, urls: &[String]) -> Vec<SourcedSummary> {
        urls.iter()
            .filter_map(|url| self.keep_or_log(url, self.summarize_source(url)))
            .collect()
    }

    /// One scoped thread per URL; results are merged back by original index.
    fn summarize_parallel(&self, urls: &[String]) -> Vec<SourcedSummary> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = urls
                .iter()
                .map(|url| scope.spawn(move || self.summarize_source(url)))
                .collect();

            handles
                .into_iter()
                .zip(urls)
                .filter_map(|(handle, url)| match handle.join() {
                    Ok(result) => self.keep_or_log(url, result),
                    Err(_) => {
                        warn!(url = %url, "source worker panicked, skipping");
                        None
                    }
                })
                .collect()
        })
    }

    fn summarize_source(&self, url: &str) -> Result<SourcedSummary, SourceFailure> {
        let content = self.fetcher.fetch_and_extract(
            url,
            self.options.max_paragraphs,
            self.options.max_chars,
        )?;
        if content.trim().is_empty() {
            return Err(SourceFailure::Fetch(FetchError::Empty));
        }

        let prompt = SUMMARY_TEMPLATE.replace("{content}", &content);
        let summary = self
            .model
            .complete(&prompt, self.options.summary_max_tokens)?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SourceFailure::EmptySummary);
        }

        Ok(SourcedSummary::new(url, summary))
    }

    fn keep_or_log(
        &self,
        url: &str,
        result: Result<SourcedSummary, SourceFailure>,
    ) -> Option<SourcedSummary> {
        match result {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(url, error = %e, "skipping source");
                None
            }
        }
    }
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !unique.contains(&url) {
            unique.push(url);
        }
    }
    unique
}
